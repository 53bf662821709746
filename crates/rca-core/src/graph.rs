//! causal graph construction and root-cause topology extraction.
//!
//! the graph is small per incident (tens of nodes, hundreds of edges), so
//! an adjacency list keyed by node id is more than sufficient — no need
//! for an index-based representation here.

use crate::constants::CAUSAL_WINDOW;
use crate::grouping::IncidentGroup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalNode {
    pub id: String,
    pub error_count: u64,
    pub first_error: Option<DateTime<Utc>>,
    pub last_error: Option<DateTime<Utc>>,
}

impl CausalNode {
    fn new(id: String) -> Self {
        Self {
            id,
            error_count: 0,
            first_error: None,
            last_error: None,
        }
    }

    fn record_error(&mut self, at: DateTime<Utc>) {
        self.error_count += 1;
        self.first_error = Some(self.first_error.map_or(at, |f| f.min(at)));
        self.last_error = Some(self.last_error.map_or(at, |l| l.max(at)));
    }
}

#[derive(Debug, Clone)]
pub struct CausalEdge {
    pub from_node: String,
    pub to_node: String,
    pub evidence: Vec<String>,
    pub time_delta: chrono::Duration,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CausalGraph {
    nodes: BTreeMap<String, CausalNode>,
    edges: Vec<CausalEdge>,
}

/// `conf = max(0, 1 - time_delta_seconds / CAUSAL_WINDOW_seconds)`,
/// guaranteeing conf >= 0.9 whenever time_delta <= 30s.
fn edge_confidence(time_delta: chrono::Duration) -> f64 {
    let window_secs = CAUSAL_WINDOW.as_secs_f64();
    let delta_secs = time_delta.num_milliseconds() as f64 / 1000.0;
    (1.0 - delta_secs / window_secs).max(0.0)
}

impl CausalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// idempotent: inserting an existing id is a no-op.
    pub fn add_node(&mut self, id: &str) {
        self.nodes
            .entry(id.to_string())
            .or_insert_with(|| CausalNode::new(id.to_string()));
    }

    pub fn record_error(&mut self, service: &str, at: DateTime<Utc>) {
        self.add_node(service);
        self.nodes.get_mut(service).unwrap().record_error(at);
    }

    /// merges an edge with an existing (from, to) pair, keeping the
    /// higher-confidence (= smaller time_delta) instance and concatenating
    /// evidence. no self-loops; both endpoints must already be nodes.
    pub fn add_edge(
        &mut self,
        from: &str,
        to: &str,
        time_delta: chrono::Duration,
        evidence: Vec<String>,
    ) {
        if from == to {
            return;
        }
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            return;
        }
        let confidence = edge_confidence(time_delta);

        if let Some(existing) = self
            .edges
            .iter_mut()
            .find(|e| e.from_node == from && e.to_node == to)
        {
            if time_delta < existing.time_delta {
                existing.time_delta = time_delta;
                existing.confidence = confidence;
            }
            existing.evidence.extend(evidence);
            return;
        }

        self.edges.push(CausalEdge {
            from_node: from.to_string(),
            to_node: to.to_string(),
            evidence,
            time_delta,
            confidence,
        });
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CausalNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[CausalEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&CausalNode> {
        self.nodes.get(id)
    }

    /// builds the graph from an incident group:
    ///   - a node per distinct service seen with any error-level event,
    ///     `error_count`/`first_error`/`last_error` accumulated on errors.
    ///   - a candidate edge A -> B for every pair of (service, timestamp)
    ///     observations, time-sorted, where B != A and the gap is within
    ///     CAUSAL_WINDOW; duplicate (from, to) pairs merge (see add_edge).
    pub fn from_incident_group(group: &IncidentGroup) -> Self {
        let mut graph = Self::new();

        for e in &group.events {
            if let (Some(svc), Some(level)) = (&e.service, e.level) {
                if level.is_error() {
                    let at = e.timestamp.unwrap_or_else(Utc::now);
                    graph.record_error(svc, at);
                }
            }
        }

        let mut timeline: Vec<(&str, DateTime<Utc>)> = group
            .events
            .iter()
            .filter_map(|e| match (&e.service, e.timestamp) {
                (Some(svc), Some(ts)) => Some((svc.as_str(), ts)),
                _ => None,
            })
            .collect();
        timeline.sort_by_key(|(_, ts)| *ts);

        for i in 0..timeline.len() {
            let (a_service, a_ts) = timeline[i];
            for (b_service, b_ts) in &timeline[i + 1..] {
                if *b_service == a_service {
                    continue;
                }
                let delta = *b_ts - a_ts;
                if delta > causal_window_chrono() {
                    break;
                }
                graph.add_node(a_service);
                graph.add_node(b_service);
                let evidence = vec![format!(
                    "{} error at {} preceded {} error at {} by {}ms",
                    a_service,
                    a_ts.to_rfc3339(),
                    b_service,
                    b_ts.to_rfc3339(),
                    delta.num_milliseconds()
                )];
                graph.add_edge(a_service, b_service, delta, evidence);
            }
        }

        graph
    }

    /// topology phase: graph sources (outgoing edges, no incoming edges).
    /// falls back to the node(s) with the earliest first_error when the
    /// graph has no edges or no source exists (closed cycle).
    pub fn root_causes(&self) -> Vec<String> {
        let has_incoming: std::collections::HashSet<&str> =
            self.edges.iter().map(|e| e.to_node.as_str()).collect();
        let has_outgoing: std::collections::HashSet<&str> =
            self.edges.iter().map(|e| e.from_node.as_str()).collect();

        let mut sources: Vec<String> = self
            .nodes
            .keys()
            .filter(|id| has_outgoing.contains(id.as_str()) && !has_incoming.contains(id.as_str()))
            .cloned()
            .collect();

        if !sources.is_empty() {
            sources.sort();
            return sources;
        }

        let earliest = self
            .nodes
            .values()
            .filter_map(|n| n.first_error.map(|t| (t, n.id.clone())))
            .min_by_key(|(t, _)| *t);

        match earliest {
            None => Vec::new(),
            Some((earliest_time, _)) => {
                let mut tied: Vec<String> = self
                    .nodes
                    .values()
                    .filter(|n| n.first_error == Some(earliest_time))
                    .map(|n| n.id.clone())
                    .collect();
                tied.sort();
                tied
            }
        }
    }

    pub fn to_projection(&self) -> GraphProjection {
        GraphProjection {
            nodes: self.nodes.values().cloned().collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeProjection {
                    from: e.from_node.clone(),
                    to: e.to_node.clone(),
                    confidence: e.confidence,
                    time_delta_seconds: e.time_delta.num_milliseconds() as f64 / 1000.0,
                    evidence: e.evidence.clone(),
                })
                .collect(),
            root_causes: self.root_causes(),
        }
    }
}

fn causal_window_chrono() -> chrono::Duration {
    chrono::Duration::from_std(CAUSAL_WINDOW).unwrap()
}

/// serializable projection for downstream consumers (§6 causal_graph key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphProjection {
    pub nodes: Vec<CausalNode>,
    pub edges: Vec<EdgeProjection>,
    pub root_causes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeProjection {
    pub from: String,
    pub to: String,
    pub confidence: f64,
    pub time_delta_seconds: f64,
    pub evidence: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::normalize;
    use serde_json::Value;
    use std::collections::HashMap;

    fn ev(service: &str, level: &str, ts: &str) -> crate::event::Event {
        let mut raw = HashMap::new();
        raw.insert("service".to_string(), Value::String(service.to_string()));
        raw.insert("level".to_string(), Value::String(level.to_string()));
        raw.insert("timestamp".to_string(), Value::String(ts.to_string()));
        normalize(raw).unwrap()
    }

    #[test]
    fn s1_single_service_no_edges() {
        let events: Vec<_> = (0..12)
            .map(|i| ev("api", "ERROR", &format!("2025-01-01T10:00:{:02}Z", i)))
            .collect();
        let group = IncidentGroup::from_events(events);
        let graph = CausalGraph::from_incident_group(&group);
        assert_eq!(graph.node("api").unwrap().error_count, 12);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.root_causes(), vec!["api".to_string()]);
    }

    #[test]
    fn s2_cascaded_services() {
        let events = vec![
            ev("api", "ERROR", "2025-01-01T10:00:00Z"),
            ev("db", "ERROR", "2025-01-01T10:00:30Z"),
            ev("cache", "ERROR", "2025-01-01T10:01:00Z"),
        ];
        let group = IncidentGroup::from_events(events);
        let graph = CausalGraph::from_incident_group(&group);
        let api_db = graph
            .edges()
            .iter()
            .find(|e| e.from_node == "api" && e.to_node == "db")
            .unwrap();
        assert!(api_db.confidence >= 0.9);
        let db_cache = graph
            .edges()
            .iter()
            .find(|e| e.from_node == "db" && e.to_node == "cache")
            .unwrap();
        assert!(db_cache.confidence >= 0.9);
        assert_eq!(graph.root_causes(), vec!["api".to_string()]);
    }

    #[test]
    fn s3_out_of_window_no_edges_fallback_root() {
        let events = vec![
            ev("api", "ERROR", "2025-01-01T10:00:00Z"),
            ev("db", "ERROR", "2025-01-01T10:10:00Z"),
        ];
        let group = IncidentGroup::from_events(events);
        let graph = CausalGraph::from_incident_group(&group);
        assert!(graph.edges().is_empty());
        assert_eq!(graph.root_causes(), vec!["api".to_string()]);
    }

    #[test]
    fn confidence_is_monotonic_in_time_delta() {
        let c1 = edge_confidence(chrono::Duration::seconds(10));
        let c2 = edge_confidence(chrono::Duration::seconds(100));
        assert!(c1 > c2);
        assert!(edge_confidence(chrono::Duration::seconds(10)) >= 0.9);
    }

    #[test]
    fn no_self_loops() {
        let mut g = CausalGraph::new();
        g.add_node("api");
        g.add_edge("api", "api", chrono::Duration::seconds(1), vec![]);
        assert!(g.edges().is_empty());
    }
}
