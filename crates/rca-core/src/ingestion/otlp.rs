//! OTLP JSON span payloads: `resourceSpans[].scopeSpans[].spans[]`,
//! nanosecond timestamps converted to instants.

use crate::error::{RcaError, Result};
use crate::trace::{Span, SpanEvent, SpanStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

fn nanos_to_instant(nanos: &str) -> Option<DateTime<Utc>> {
    let nanos: i128 = nanos.parse().ok()?;
    let secs = (nanos / 1_000_000_000) as i64;
    let subsec_nanos = (nanos % 1_000_000_000) as u32;
    DateTime::from_timestamp(secs, subsec_nanos)
}

fn status_code_to_status(code: Option<&Value>) -> SpanStatus {
    match code.and_then(|v| v.as_u64()) {
        Some(1) => SpanStatus::Ok,
        Some(2) => SpanStatus::Error,
        _ => SpanStatus::Unset,
    }
}

fn attributes_map(value: Option<&Value>) -> HashMap<String, Value> {
    let mut out = HashMap::new();
    let Some(Value::Array(items)) = value else {
        return out;
    };
    for item in items {
        let Some(key) = item.get("key").and_then(|k| k.as_str()) else {
            continue;
        };
        let Some(val) = item.get("value") else {
            continue;
        };
        let scalar = val
            .get("stringValue")
            .or_else(|| val.get("intValue"))
            .or_else(|| val.get("boolValue"))
            .or_else(|| val.get("doubleValue"))
            .cloned()
            .unwrap_or(Value::Null);
        out.insert(key.to_string(), scalar);
    }
    out
}

fn resource_service_name(resource: Option<&Value>) -> String {
    attributes_map(resource.and_then(|r| r.get("attributes")))
        .get("service.name")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown_service")
        .to_string()
}

fn span_events(value: Option<&Value>) -> Vec<SpanEvent> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let name = item.get("name")?.as_str()?.to_string();
            let time = item
                .get("timeUnixNano")
                .and_then(|v| v.as_str())
                .and_then(nanos_to_instant)?;
            let attributes = attributes_map(item.get("attributes"));
            Some(SpanEvent { name, time, attributes })
        })
        .collect()
}

/// parses the full `resourceSpans` payload into a flat list of spans,
/// one per-service `service.name` resource attribute resolved eagerly.
pub fn parse_otlp(payload: &str) -> Result<Vec<Span>> {
    let root: Value = serde_json::from_str(payload)?;
    let resource_spans = root
        .get("resourceSpans")
        .and_then(|v| v.as_array())
        .ok_or_else(|| RcaError::InvalidFormat("missing resourceSpans array".to_string()))?;

    let mut spans = Vec::new();

    for resource_span in resource_spans {
        let service_name = resource_service_name(resource_span.get("resource"));
        let scope_spans = resource_span
            .get("scopeSpans")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        for scope_span in &scope_spans {
            let raw_spans = scope_span
                .get("spans")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default();

            for raw in &raw_spans {
                let trace_id = raw
                    .get("traceId")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| RcaError::InvalidFormat("span missing traceId".to_string()))?
                    .to_string();
                let span_id = raw
                    .get("spanId")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| RcaError::InvalidFormat("span missing spanId".to_string()))?
                    .to_string();
                let parent_span_id = raw
                    .get("parentSpanId")
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string());
                let operation_name = raw
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown_span")
                    .to_string();

                let start_time = raw
                    .get("startTimeUnixNano")
                    .and_then(|v| v.as_str())
                    .and_then(nanos_to_instant)
                    .ok_or_else(|| {
                        RcaError::InvalidFormat(format!("span {span_id} has no startTimeUnixNano"))
                    })?;
                let end_time = raw
                    .get("endTimeUnixNano")
                    .and_then(|v| v.as_str())
                    .and_then(nanos_to_instant)
                    .unwrap_or(start_time);

                let status = status_code_to_status(raw.get("status").and_then(|s| s.get("code")));
                let attributes = attributes_map(raw.get("attributes"));
                let events = span_events(raw.get("events"));

                spans.push(Span {
                    trace_id,
                    span_id,
                    parent_span_id,
                    service_name: service_name.clone(),
                    operation_name,
                    start_time,
                    end_time,
                    status,
                    attributes,
                    events,
                });
            }
        }
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_span_with_nanosecond_timestamps() {
        let payload = r#"{
            "resourceSpans": [{
                "resource": { "attributes": [
                    { "key": "service.name", "value": { "stringValue": "checkout" } }
                ] },
                "scopeSpans": [{
                    "spans": [{
                        "traceId": "t1",
                        "spanId": "s1",
                        "name": "handle_request",
                        "startTimeUnixNano": "1700000000000000000",
                        "endTimeUnixNano": "1700000000500000000",
                        "status": { "code": 2 }
                    }]
                }]
            }]
        }"#;
        let spans = parse_otlp(payload).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].service_name, "checkout");
        assert_eq!(spans[0].status, SpanStatus::Error);
        assert_eq!(spans[0].duration_ms(), 500);
    }

    #[test]
    fn rejects_payload_without_resource_spans() {
        assert!(parse_otlp("{}").is_err());
    }
}
