//! span-tree analysis: critical path, error propagation, slow spans,
//! service dependencies, and cross-trace aggregation.

use crate::constants::{ERROR_WINDOW_MS, SLOW_SPAN_THRESHOLD_MS};
use crate::error::{RcaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    Ok,
    Error,
    Unset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanEvent {
    pub name: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub service_name: String,
    pub operation_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SpanStatus,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    #[serde(default)]
    pub events: Vec<SpanEvent>,
}

impl Span {
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    pub fn is_error(&self) -> bool {
        self.status == SpanStatus::Error
    }
}

#[derive(Debug, Clone)]
pub struct Trace {
    pub trace_id: String,
    pub spans: Vec<Span>,
    pub root_span_id: String,
    pub services: BTreeSet<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub has_errors: bool,
}

impl Trace {
    /// rejects the trace as malformed unless exactly one span has no
    /// parent reference within the set.
    pub fn from_spans(spans: Vec<Span>) -> Result<Self> {
        if spans.is_empty() {
            return Err(RcaError::InvalidFormat("trace has no spans".to_string()));
        }
        let trace_id = spans[0].trace_id.clone();

        let roots: Vec<&Span> = spans.iter().filter(|s| s.parent_span_id.is_none()).collect();
        if roots.len() != 1 {
            return Err(RcaError::InvalidFormat(format!(
                "trace {} has {} root spans, expected exactly 1",
                trace_id,
                roots.len()
            )));
        }
        let root_span_id = roots[0].span_id.clone();

        let services: BTreeSet<String> = spans.iter().map(|s| s.service_name.clone()).collect();
        let start_time = spans.iter().map(|s| s.start_time).min().unwrap();
        let end_time = spans.iter().map(|s| s.end_time).max().unwrap();
        let has_errors = spans.iter().any(|s| s.is_error());

        Ok(Trace {
            trace_id,
            spans,
            root_span_id,
            services,
            start_time,
            end_time,
            has_errors,
        })
    }

    pub fn span(&self, id: &str) -> Option<&Span> {
        self.spans.iter().find(|s| s.span_id == id)
    }

    fn children_of<'a>(&'a self, id: &str) -> Vec<&'a Span> {
        self.spans
            .iter()
            .filter(|s| s.parent_span_id.as_deref() == Some(id))
            .collect()
    }

    /// root span plus, recursively, the child whose subtree has the
    /// largest summed duration. ties broken by highest direct duration,
    /// then by span id.
    pub fn critical_path(&self) -> Vec<&Span> {
        let mut path = Vec::new();
        let mut current = self.span(&self.root_span_id);
        while let Some(span) = current {
            path.push(span);
            let children = self.children_of(&span.span_id);
            current = children
                .into_iter()
                .map(|c| (subtree_duration(self, c), c.duration_ms(), c.span_id.clone(), c))
                .max_by(|a, b| {
                    a.0.cmp(&b.0)
                        .then_with(|| a.1.cmp(&b.1))
                        .then_with(|| a.2.cmp(&b.2))
                })
                .map(|(_, _, _, c)| c);
        }
        path
    }
}

fn subtree_duration(trace: &Trace, span: &Span) -> i64 {
    let mut total = span.duration_ms();
    for child in trace.children_of(&span.span_id) {
        total += subtree_duration(trace, child);
    }
    total
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHop {
    pub from_service: String,
    pub to_service: String,
    pub time_diff_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanSummary {
    pub span_id: String,
    pub service_name: String,
    pub operation_name: String,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TraceIssue {
    TraceError {
        services: Vec<String>,
    },
    ErrorPropagation {
        hops: Vec<ErrorHop>,
    },
    SlowSpans {
        spans: Vec<SpanSummary>,
    },
    SlowCriticalPath {
        total_duration_ms: i64,
        span_ids: Vec<String>,
    },
    ServiceDependencies {
        pairs: Vec<(String, String)>,
    },
}

fn detect_trace_error(trace: &Trace) -> Option<TraceIssue> {
    let mut services: Vec<String> = trace
        .spans
        .iter()
        .filter(|s| s.is_error())
        .map(|s| s.service_name.clone())
        .collect();
    if services.is_empty() {
        return None;
    }
    services.sort();
    services.dedup();
    Some(TraceIssue::TraceError { services })
}

/// consecutive error spans, sorted by start time, whose gap (next.start -
/// prev.end) falls within [0, ERROR_WINDOW_MS], become one propagation hop.
fn detect_error_propagation(trace: &Trace) -> Option<TraceIssue> {
    let mut errors: Vec<&Span> = trace.spans.iter().filter(|s| s.is_error()).collect();
    if errors.len() < 2 {
        return None;
    }
    errors.sort_by_key(|s| s.start_time);

    let mut hops = Vec::new();
    for pair in errors.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let diff = (next.start_time - prev.end_time).num_milliseconds();
        if diff >= 0 && diff <= ERROR_WINDOW_MS {
            hops.push(ErrorHop {
                from_service: prev.service_name.clone(),
                to_service: next.service_name.clone(),
                time_diff_ms: diff,
            });
        }
    }

    if hops.is_empty() {
        None
    } else {
        Some(TraceIssue::ErrorPropagation { hops })
    }
}

fn detect_slow_spans(trace: &Trace) -> Option<TraceIssue> {
    let mut slow: Vec<&Span> = trace
        .spans
        .iter()
        .filter(|s| s.duration_ms() > SLOW_SPAN_THRESHOLD_MS)
        .collect();
    if slow.is_empty() {
        return None;
    }
    slow.sort_by(|a, b| b.duration_ms().cmp(&a.duration_ms()));
    slow.truncate(5);

    Some(TraceIssue::SlowSpans {
        spans: slow
            .into_iter()
            .map(|s| SpanSummary {
                span_id: s.span_id.clone(),
                service_name: s.service_name.clone(),
                operation_name: s.operation_name.clone(),
                duration_ms: s.duration_ms(),
            })
            .collect(),
    })
}

fn detect_slow_critical_path(trace: &Trace) -> Option<TraceIssue> {
    let path = trace.critical_path();
    let total: i64 = path.iter().map(|s| s.duration_ms()).sum();
    if total > SLOW_SPAN_THRESHOLD_MS {
        Some(TraceIssue::SlowCriticalPath {
            total_duration_ms: total,
            span_ids: path.iter().map(|s| s.span_id.clone()).collect(),
        })
    } else {
        None
    }
}

fn detect_service_dependencies(trace: &Trace) -> Option<TraceIssue> {
    if trace.services.len() < 2 {
        return None;
    }
    let mut pairs: Vec<(String, String)> = Vec::new();
    for span in &trace.spans {
        if let Some(parent_id) = &span.parent_span_id {
            if let Some(parent) = trace.span(parent_id) {
                if parent.service_name != span.service_name {
                    let pair = (parent.service_name.clone(), span.service_name.clone());
                    if !pairs.contains(&pair) {
                        pairs.push(pair);
                    }
                }
            }
        }
    }
    if pairs.is_empty() {
        None
    } else {
        Some(TraceIssue::ServiceDependencies { pairs })
    }
}

pub fn analyze_trace(trace: &Trace) -> Vec<TraceIssue> {
    [
        detect_trace_error(trace),
        detect_error_propagation(trace),
        detect_slow_spans(trace),
        detect_slow_critical_path(trace),
        detect_service_dependencies(trace),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceOperationStats {
    pub count: u64,
    pub error_count: u64,
    pub error_rate: f64,
    pub total_duration_ms: i64,
    pub min_duration_ms: i64,
    pub max_duration_ms: i64,
    pub avg_duration_ms: f64,
}

/// per-(service, operation) statistics across many traces.
pub fn aggregate_traces(traces: &[Trace]) -> HashMap<(String, String), ServiceOperationStats> {
    let mut agg: HashMap<(String, String), ServiceOperationStats> = HashMap::new();

    for trace in traces {
        for span in &trace.spans {
            let key = (span.service_name.clone(), span.operation_name.clone());
            let entry = agg.entry(key).or_default();
            let d = span.duration_ms();
            entry.count += 1;
            if span.is_error() {
                entry.error_count += 1;
            }
            entry.total_duration_ms += d;
            entry.min_duration_ms = if entry.count == 1 {
                d
            } else {
                entry.min_duration_ms.min(d)
            };
            entry.max_duration_ms = entry.max_duration_ms.max(d);
        }
    }

    for stats in agg.values_mut() {
        stats.error_rate = stats.error_count as f64 / stats.count as f64;
        stats.avg_duration_ms = stats.total_duration_ms as f64 / stats.count as f64;
    }

    agg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(id: &str, parent: Option<&str>, svc: &str, status: SpanStatus, start: i64, end: i64) -> Span {
        Span {
            trace_id: "t1".to_string(),
            span_id: id.to_string(),
            parent_span_id: parent.map(|s| s.to_string()),
            service_name: svc.to_string(),
            operation_name: "op".to_string(),
            start_time: DateTime::from_timestamp_millis(start).unwrap(),
            end_time: DateTime::from_timestamp_millis(end).unwrap(),
            status,
            attributes: HashMap::new(),
            events: Vec::new(),
        }
    }

    #[test]
    fn s4_trace_with_propagation() {
        let a = span("A", None, "root-svc", SpanStatus::Ok, 0, 200);
        let b = span("B", Some("A"), "X", SpanStatus::Error, 0, 100);
        let c = span("C", Some("A"), "Y", SpanStatus::Error, 150, 200);
        let trace = Trace::from_spans(vec![a, b, c]).unwrap();
        let issues = analyze_trace(&trace);

        let trace_error = issues
            .iter()
            .find(|i| matches!(i, TraceIssue::TraceError { .. }))
            .unwrap();
        if let TraceIssue::TraceError { services } = trace_error {
            assert_eq!(services, &vec!["X".to_string(), "Y".to_string()]);
        }

        let propagation = issues
            .iter()
            .find(|i| matches!(i, TraceIssue::ErrorPropagation { .. }))
            .unwrap();
        if let TraceIssue::ErrorPropagation { hops } = propagation {
            assert_eq!(hops.len(), 1);
            assert_eq!(hops[0].from_service, "X");
            assert_eq!(hops[0].to_service, "Y");
            assert_eq!(hops[0].time_diff_ms, 50);
        }
    }

    #[test]
    fn single_root_required() {
        let a = span("A", None, "s", SpanStatus::Ok, 0, 10);
        let b = span("B", None, "s", SpanStatus::Ok, 0, 10);
        assert!(Trace::from_spans(vec![a, b]).is_err());
    }

    #[test]
    fn critical_path_picks_max_duration_subtree() {
        let root = span("A", None, "s", SpanStatus::Ok, 0, 1000);
        let slow_child = span("B", Some("A"), "s", SpanStatus::Ok, 0, 900);
        let fast_child = span("C", Some("A"), "s", SpanStatus::Ok, 0, 100);
        let trace = Trace::from_spans(vec![root, slow_child, fast_child]).unwrap();
        let path = trace.critical_path();
        assert_eq!(path.len(), 2);
        assert_eq!(path[1].span_id, "B");
    }
}
