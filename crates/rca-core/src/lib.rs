//! core types and analysis pipeline for the root-cause-analysis engine.
//! ingest events from whatever format they arrive in, group them into
//! incidents, build a causal graph, and extract a ranked set of
//! probable root causes with recommended actions.

pub mod alerts;
pub mod analyzer;
pub mod anomaly;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod graph;
pub mod grouping;
pub mod ingestion;
pub mod level;
pub mod resilience;
pub mod security;
pub mod trace;
pub mod validation;

pub use analyzer::{analyze_incident, AnalysisResult, RootCause};
pub use error::{RcaError, Result};
pub use event::{normalize, Event, RawRecord};
pub use graph::CausalGraph;
pub use grouping::{group_by_service_then_time, group_by_time_window, IncidentGroup};
pub use level::Level;
