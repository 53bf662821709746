//! partitions an event stream into incident groups by time window and/or
//! service. pure, deterministic, no I/O.

use crate::event::Event;
use crate::level::Level;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::time::Duration;

/// a derived, non-persistent bundle of events. immutable once built.
#[derive(Debug, Clone)]
pub struct IncidentGroup {
    pub events: Vec<Event>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub services: BTreeSet<String>,
    pub severity: Option<Level>,
}

impl IncidentGroup {
    pub fn from_events(events: Vec<Event>) -> Self {
        let mut start_time = None;
        let mut end_time = None;
        let mut services = BTreeSet::new();
        let mut severity: Option<Level> = None;

        for e in &events {
            if let Some(ts) = e.timestamp {
                start_time = Some(start_time.map_or(ts, |s: DateTime<Utc>| s.min(ts)));
                end_time = Some(end_time.map_or(ts, |s: DateTime<Utc>| s.max(ts)));
            }
            if let Some(svc) = &e.service {
                services.insert(svc.clone());
            }
            if let Some(lvl) = e.level {
                severity = Some(match severity {
                    Some(cur) if cur >= lvl => cur,
                    _ => lvl,
                });
            }
        }

        IncidentGroup {
            events,
            start_time,
            end_time,
            services,
            severity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

fn chrono_duration(window: Duration) -> chrono::Duration {
    chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(3650))
}

/// sort events with a present timestamp ascending (stable — ties keep input
/// order), open/close groups as the gap to the last-appended event exceeds
/// `window`, and hold undated events aside for a single terminal group.
pub fn group_by_time_window(
    events: Vec<Event>,
    window: Duration,
    min_events: usize,
) -> Vec<IncidentGroup> {
    let mut dated: Vec<Event> = Vec::new();
    let mut undated: Vec<Event> = Vec::new();
    for e in events {
        if e.timestamp.is_some() {
            dated.push(e);
        } else {
            undated.push(e);
        }
    }

    dated.sort_by_key(|e| e.timestamp.unwrap());

    let window = chrono_duration(window);
    let mut groups = Vec::new();
    let mut current: Vec<Event> = Vec::new();
    let mut last_ts: Option<DateTime<Utc>> = None;

    for e in dated {
        let ts = e.timestamp.unwrap();
        match last_ts {
            Some(last) if ts - last <= window => {
                current.push(e);
                last_ts = Some(ts);
            }
            None => {
                current.push(e);
                last_ts = Some(ts);
            }
            Some(_) => {
                if current.len() >= min_events {
                    groups.push(IncidentGroup::from_events(std::mem::take(&mut current)));
                } else {
                    current.clear();
                }
                current.push(e);
                last_ts = Some(ts);
            }
        }
    }
    if !current.is_empty() && current.len() >= min_events {
        groups.push(IncidentGroup::from_events(current));
    }

    if !undated.is_empty() && undated.len() >= min_events {
        groups.push(IncidentGroup::from_events(undated));
    }

    groups
}

/// partition by service, then apply time-window grouping within each
/// partition. events with no service are treated as their own partition
/// keyed by the empty string, preserving the time-window semantics above.
pub fn group_by_service_then_time(
    events: Vec<Event>,
    window: Duration,
    min_events_per_service: usize,
) -> Vec<IncidentGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut partitions: std::collections::HashMap<String, Vec<Event>> =
        std::collections::HashMap::new();

    for e in events {
        let key = e.service.clone().unwrap_or_default();
        if !partitions.contains_key(&key) {
            order.push(key.clone());
        }
        partitions.entry(key).or_default().push(e);
    }

    let mut groups = Vec::new();
    for key in order {
        let part = partitions.remove(&key).unwrap_or_default();
        groups.extend(group_by_time_window(part, window, min_events_per_service));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::normalize;
    use serde_json::Value;
    use std::collections::HashMap;

    fn ev(service: &str, level: &str, ts: &str) -> Event {
        let mut raw = HashMap::new();
        raw.insert("service".to_string(), Value::String(service.to_string()));
        raw.insert("level".to_string(), Value::String(level.to_string()));
        raw.insert("timestamp".to_string(), Value::String(ts.to_string()));
        normalize(raw).unwrap()
    }

    #[test]
    fn single_service_one_group() {
        let events: Vec<Event> = (0..12)
            .map(|i| {
                ev(
                    "api",
                    "ERROR",
                    &format!("2025-01-01T10:00:{:02}Z", i),
                )
            })
            .collect();
        let groups = group_by_time_window(events, Duration::from_secs(300), 1);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].events.len(), 12);
    }

    #[test]
    fn out_of_window_splits_groups() {
        let events = vec![
            ev("api", "ERROR", "2025-01-01T10:00:00Z"),
            ev("db", "ERROR", "2025-01-01T10:10:00Z"),
        ];
        let groups = group_by_time_window(events, Duration::from_secs(300), 1);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn undated_events_form_terminal_group() {
        let mut raw = HashMap::new();
        raw.insert("message".to_string(), Value::String("no time".to_string()));
        let undated = normalize(raw).unwrap();
        let groups = group_by_time_window(vec![undated], Duration::from_secs(300), 1);
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn service_then_time_partitions() {
        let events = vec![
            ev("api", "ERROR", "2025-01-01T10:00:00Z"),
            ev("db", "ERROR", "2025-01-01T10:00:01Z"),
        ];
        let groups = group_by_service_then_time(events, Duration::from_secs(300), 1);
        assert_eq!(groups.len(), 2);
    }
}
