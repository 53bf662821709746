//! the normalized Event, and the `normalize` entry point every ingestion
//! adapter converges on.

use crate::constants::TIMESTAMP_PARSE_CACHE_MIN;
use crate::error::{RcaError, Result};
use crate::level::Level;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// a source-specific record before it has been mapped onto the five
/// well-known Event fields. carries everything the adapter read,
/// opaquely, under the raw record's own key names.
pub type RawRecord = HashMap<String, Value>;

/// fully normalized observation. every ingestion path converges here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: Option<DateTime<Utc>>,
    pub service: Option<String>,
    pub level: Option<Level>,
    pub message: Option<String>,
    pub raw: RawRecord,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Event {
    pub fn is_error(&self) -> bool {
        self.level.map(|l| l.is_error()).unwrap_or(false)
    }
}

fn field_str<'a>(raw: &'a RawRecord, keys: &[&str]) -> Option<&'a str> {
    for key in keys {
        if let Some(v) = raw.get(*key) {
            if let Some(s) = v.as_str() {
                if !s.is_empty() {
                    return Some(s);
                }
            }
        }
    }
    None
}

/// Public contract: normalize(raw) -> Event | ParseError/ValidationError.
///
/// Field mapping (first non-empty wins):
///   service   <- raw.service | raw.component
///   level     <- raw.level   | raw.severity
///   timestamp <- raw.timestamp (best-effort, cached)
///   message   <- raw.message
pub fn normalize(raw: RawRecord) -> Result<Event> {
    let service = field_str(&raw, &["service", "component"]).map(|s| s.to_string());
    let level = field_str(&raw, &["level", "severity"]).and_then(Level::parse);
    let message = field_str(&raw, &["message"]).map(|s| s.to_string());
    let timestamp = field_str(&raw, &["timestamp"]).and_then(parse_timestamp_cached);

    if service.as_deref().unwrap_or("").is_empty() && message.as_deref().unwrap_or("").is_empty()
    {
        return Err(RcaError::Validation(
            "event must have a non-empty service or message".to_string(),
        ));
    }

    Ok(Event {
        timestamp,
        service,
        level,
        message,
        raw,
        metadata: HashMap::new(),
    })
}

// ------------------------------------------------------------------
// timestamp parsing + cache
// ------------------------------------------------------------------

struct TimestampCache {
    capacity: usize,
    map: HashMap<String, Option<DateTime<Utc>>>,
    order: VecDeque<String>,
}

impl TimestampCache {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get_or_insert(&mut self, key: &str) -> Option<DateTime<Utc>> {
        if let Some(hit) = self.map.get(key) {
            return *hit;
        }
        let parsed = parse_timestamp_uncached(key);
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.map.insert(key.to_string(), parsed);
        self.order.push_back(key.to_string());
        parsed
    }
}

static TIMESTAMP_CACHE: Mutex<Option<TimestampCache>> = Mutex::new(None);

fn parse_timestamp_cached(s: &str) -> Option<DateTime<Utc>> {
    let mut guard = TIMESTAMP_CACHE.lock().unwrap();
    let cache = guard.get_or_insert_with(|| TimestampCache::new(TIMESTAMP_PARSE_CACHE_MIN));
    cache.get_or_insert(s)
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

fn parse_timestamp_uncached(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn normalize_maps_known_fields() {
        let raw = rec(&[
            ("service", "api"),
            ("level", "error"),
            ("timestamp", "2025-01-01T10:00:00Z"),
            ("message", "boom"),
        ]);
        let e = normalize(raw).unwrap();
        assert_eq!(e.service.as_deref(), Some("api"));
        assert_eq!(e.level, Some(Level::Error));
        assert!(e.timestamp.is_some());
        assert_eq!(e.message.as_deref(), Some("boom"));
    }

    #[test]
    fn normalize_falls_back_to_component_and_severity() {
        let raw = rec(&[("component", "db"), ("severity", "warn")]);
        let e = normalize(raw).unwrap();
        assert_eq!(e.service.as_deref(), Some("db"));
        assert_eq!(e.level, Some(Level::Warn));
    }

    #[test]
    fn normalize_rejects_empty_service_and_message() {
        let raw = rec(&[("level", "info")]);
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn bad_timestamp_is_non_fatal() {
        let raw = rec(&[("service", "api"), ("timestamp", "not-a-date")]);
        let e = normalize(raw).unwrap();
        assert!(e.timestamp.is_none());
    }
}
