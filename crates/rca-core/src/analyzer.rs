//! fuses the causal graph, incident group, and error-pattern statistics
//! into the final analysis result. this is the only component that is
//! allowed to produce the pipeline's externally visible output.

use crate::constants::{
    CONFIDENCE_HIGH, CONFIDENCE_LOW, CONFIDENCE_MEDIUM, PRIORITY_CRITICAL, PRIORITY_HIGH,
    PRIORITY_LOW, PRIORITY_MEDIUM, REPEATED_ERROR_THRESHOLD, TOP_K_ERRORS,
};
use crate::graph::{CausalGraph, GraphProjection};
use crate::grouping::IncidentGroup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootCause {
    pub description: String,
    pub confidence: f64,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionCategory {
    Investigate,
    Fix,
    Monitor,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub description: String,
    pub priority: u8,
    pub category: ActionCategory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub incident_summary: String,
    #[serde(rename = "probable_root_causes")]
    pub root_causes: Vec<RootCause>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub affected_services: Vec<String>,
    pub event_count: usize,
    pub time_range: Option<TimeRange>,
    pub causal_graph: Option<GraphProjection>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// top-K most common error messages (descending count) and the frequency
/// of each distinct level, scanned over the group's events.
pub struct ErrorPatternStats {
    pub most_common_errors: Vec<(String, usize)>,
    pub error_types: HashMap<String, usize>,
}

fn error_pattern_stats(group: &IncidentGroup) -> ErrorPatternStats {
    let mut message_counts: HashMap<String, usize> = HashMap::new();
    let mut message_order: Vec<String> = Vec::new();
    let mut error_types: HashMap<String, usize> = HashMap::new();

    for e in &group.events {
        if let Some(level) = e.level {
            *error_types.entry(level.as_str().to_string()).or_insert(0) += 1;
        }
        if e.is_error() {
            if let Some(msg) = &e.message {
                if !message_counts.contains_key(msg) {
                    message_order.push(msg.clone());
                }
                *message_counts.entry(msg.clone()).or_insert(0) += 1;
            }
        }
    }

    let mut most_common_errors: Vec<(String, usize)> = message_order
        .into_iter()
        .map(|m| {
            let c = message_counts[&m];
            (m, c)
        })
        .collect();
    most_common_errors.sort_by(|a, b| b.1.cmp(&a.1));
    most_common_errors.truncate(TOP_K_ERRORS);

    ErrorPatternStats {
        most_common_errors,
        error_types,
    }
}

fn services_by_error_count(group: &IncidentGroup, graph: &CausalGraph) -> Vec<String> {
    let mut services: Vec<String> = group.services.iter().cloned().collect();
    services.sort_by(|a, b| {
        let ca = graph.node(a).map(|n| n.error_count).unwrap_or(0);
        let cb = graph.node(b).map(|n| n.error_count).unwrap_or(0);
        cb.cmp(&ca).then_with(|| a.cmp(b))
    });
    services
}

fn generate_summary(
    group: &IncidentGroup,
    graph: &CausalGraph,
    root_cause_services: &[String],
) -> String {
    let services = services_by_error_count(group, graph);
    let service_count = services.len();

    let shown: Vec<&str> = services.iter().take(3).map(|s| s.as_str()).collect();
    let mut service_part = shown.join(", ");
    if service_count > 3 {
        service_part = format!("{} (+{} more)", service_part, service_count - 3);
    }

    let mut parts = vec![format!(
        "{} events across {} service{}: {}",
        group.events.len(),
        service_count,
        if service_count == 1 { "" } else { "s" },
        service_part
    )];

    if !root_cause_services.is_empty() {
        parts.push(format!(
            "likely root cause: {}",
            root_cause_services.join(", ")
        ));
    }

    if let Some(sev) = group.severity {
        parts.push(format!("highest severity: {}", sev.as_str()));
    }

    parts.join(". ")
}

fn root_cause_hypotheses(
    group: &IncidentGroup,
    graph: &CausalGraph,
    stats: &ErrorPatternStats,
) -> Vec<RootCause> {
    let mut hypotheses = Vec::new();

    for service in graph.root_causes() {
        if let Some(node) = graph.node(&service) {
            let caused: Vec<&str> = graph
                .edges()
                .iter()
                .filter(|e| e.from_node == service)
                .map(|e| e.to_node.as_str())
                .collect();

            let mut evidence = vec![
                format!("{} errors observed", node.error_count),
                node.first_error
                    .map(|t| format!("first error at {}", t.to_rfc3339()))
                    .unwrap_or_else(|| "no timestamped errors".to_string()),
            ];
            if !caused.is_empty() {
                evidence.push(format!("likely caused errors in {}", caused.join(", ")));
            }

            hypotheses.push(RootCause {
                description: format!("{} service failure or degradation", service),
                confidence: CONFIDENCE_HIGH,
                evidence,
            });
        }
    }

    if let Some((top_message, top_count)) = stats.most_common_errors.first() {
        let total = group.events.len().max(1);
        let fraction = *top_count as f64 / total as f64;
        if fraction >= REPEATED_ERROR_THRESHOLD {
            hypotheses.push(RootCause {
                description: format!("repeated error pattern: {}", top_message),
                confidence: CONFIDENCE_MEDIUM,
                evidence: vec![format!(
                    "{} of {} events ({:.0}%) share this message",
                    top_count,
                    total,
                    fraction * 100.0
                )],
            });
        }
    }

    if hypotheses.is_empty() {
        hypotheses.push(RootCause {
            description: "generic cascading failure across services".to_string(),
            confidence: CONFIDENCE_LOW,
            evidence: vec!["no dominant root-cause signal found".to_string()],
        });
    }

    hypotheses
}

fn recommended_actions(
    group: &IncidentGroup,
    graph: &CausalGraph,
    root_cause_services: &[String],
) -> Vec<RecommendedAction> {
    let mut actions = Vec::new();

    if !root_cause_services.is_empty() {
        actions.push(RecommendedAction {
            description: format!("investigate {}", root_cause_services.join(", ")),
            priority: PRIORITY_CRITICAL,
            category: ActionCategory::Investigate,
        });
    }

    if group.events.iter().any(|e| {
        e.level
            .map(|l| l.is_critical_or_fatal())
            .unwrap_or(false)
    }) {
        actions.push(RecommendedAction {
            description: "review critical errors immediately".to_string(),
            priority: PRIORITY_CRITICAL,
            category: ActionCategory::Investigate,
        });
    }

    for service in services_by_error_count(group, graph).into_iter().take(3) {
        actions.push(RecommendedAction {
            description: format!("check {} logs, metrics, recent deployments", service),
            priority: PRIORITY_HIGH,
            category: ActionCategory::Investigate,
        });
    }

    actions.push(RecommendedAction {
        description: "set up alerts for similar patterns".to_string(),
        priority: PRIORITY_MEDIUM,
        category: ActionCategory::Monitor,
    });
    actions.push(RecommendedAction {
        description: "document in incident postmortem".to_string(),
        priority: PRIORITY_LOW,
        category: ActionCategory::Document,
    });

    actions
}

/// main entry point: group -> analysis result. builds its own causal graph.
pub fn analyze_incident(group: &IncidentGroup) -> AnalysisResult {
    if group.is_empty() {
        return AnalysisResult {
            incident_summary: "No events to analyze".to_string(),
            root_causes: Vec::new(),
            recommended_actions: Vec::new(),
            affected_services: Vec::new(),
            event_count: 0,
            time_range: None,
            causal_graph: None,
            metadata: HashMap::new(),
        };
    }

    let graph = CausalGraph::from_incident_group(group);
    let stats = error_pattern_stats(group);
    let root_cause_services = graph.root_causes();

    let summary = generate_summary(group, &graph, &root_cause_services);
    let root_causes = root_cause_hypotheses(group, &graph, &stats);
    let actions = recommended_actions(group, &graph, &root_cause_services);

    let time_range = match (group.start_time, group.end_time) {
        (Some(s), Some(e)) => Some(TimeRange { start: s, end: e }),
        _ => None,
    };

    let mut metadata = HashMap::new();
    metadata.insert(
        "error_types".to_string(),
        serde_json::to_value(&stats.error_types).unwrap_or(Value::Null),
    );
    metadata.insert("llm_analysis".to_string(), Value::Bool(false));

    AnalysisResult {
        incident_summary: summary,
        root_causes,
        recommended_actions: actions,
        affected_services: group.services.iter().cloned().collect(),
        event_count: group.events.len(),
        time_range,
        causal_graph: Some(graph.to_projection()),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::normalize;
    use serde_json::Value as JValue;
    use std::collections::HashMap as StdHashMap;

    fn ev(service: &str, level: &str, msg: &str, ts: &str) -> crate::event::Event {
        let mut raw = StdHashMap::new();
        raw.insert("service".to_string(), JValue::String(service.to_string()));
        raw.insert("level".to_string(), JValue::String(level.to_string()));
        raw.insert("message".to_string(), JValue::String(msg.to_string()));
        raw.insert("timestamp".to_string(), JValue::String(ts.to_string()));
        normalize(raw).unwrap()
    }

    #[test]
    fn empty_group_contract() {
        let group = IncidentGroup::from_events(vec![]);
        let result = analyze_incident(&group);
        assert_eq!(result.incident_summary, "No events to analyze");
        assert!(result.root_causes.is_empty());
    }

    #[test]
    fn s1_single_service_repeated_failure() {
        let events: Vec<_> = (0..12)
            .map(|i| {
                ev(
                    "api",
                    "ERROR",
                    "Connection timeout",
                    &format!("2025-01-01T10:00:{:02}Z", i),
                )
            })
            .collect();
        let group = IncidentGroup::from_events(events);
        let result = analyze_incident(&group);
        assert!(result.incident_summary.contains("12 events"));
        assert!(result.incident_summary.contains("1 service"));
        assert!(result.incident_summary.contains("api"));
        assert!(result
            .root_causes
            .iter()
            .any(|r| r.description.contains("api")));
        assert!(result
            .root_causes
            .iter()
            .any(|r| r.description.contains("Connection timeout")));
    }

    #[test]
    fn s2_cascaded_services_priority_one_action() {
        let events = vec![
            ev("api", "ERROR", "upstream failure", "2025-01-01T10:00:00Z"),
            ev("db", "ERROR", "pool exhausted", "2025-01-01T10:00:30Z"),
            ev("cache", "ERROR", "miss storm", "2025-01-01T10:01:00Z"),
        ];
        let group = IncidentGroup::from_events(events);
        let result = analyze_incident(&group);
        assert!(result.recommended_actions.iter().any(|a| a.priority == 1
            && a.description.contains("api")
            && a.description.starts_with("investigate")));
    }
}
