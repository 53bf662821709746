//! cloud log platform adapters (CloudWatch, Cloud Logging, Azure
//! Monitor). these are contracts only — no SDK client is wired up here,
//! the actual API calls are an external collaborator's job.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

use crate::level::Level;

#[derive(Debug, Clone)]
pub struct CloudLogEntry {
    pub instant: DateTime<Utc>,
    pub severity: Level,
    pub service_hint: Option<String>,
    pub message: String,
    pub metadata: HashMap<String, Value>,
}

/// every cloud adapter yields entries through this contract. callers
/// pull a lazy sequence rather than a single bulk load, since cloud
/// APIs paginate.
pub trait CloudSource {
    /// provider tag stamped into each entry's metadata, e.g.
    /// "cloudwatch", "gcp_cloud_logging", "azure_monitor".
    fn provider(&self) -> &'static str;

    /// pull the next page of entries; an empty vec means exhausted.
    fn next_page(&mut self) -> crate::error::Result<Vec<CloudLogEntry>>;
}

/// maps a provider-native severity string onto our level scale. each
/// provider's own vocabulary is folded on first call; unknown strings
/// default to Info rather than failing the whole entry.
pub fn map_severity(provider: &str, raw: &str) -> Level {
    let normalized = raw.trim().to_uppercase();
    match provider {
        "cloudwatch" => match normalized.as_str() {
            "FATAL" => Level::Fatal,
            "ERROR" => Level::Error,
            "WARN" | "WARNING" => Level::Warn,
            "DEBUG" => Level::Debug,
            _ => Level::Info,
        },
        "gcp_cloud_logging" => match normalized.as_str() {
            "EMERGENCY" | "ALERT" | "CRITICAL" => Level::Critical,
            "ERROR" => Level::Error,
            "WARNING" => Level::Warn,
            "DEBUG" => Level::Debug,
            _ => Level::Info,
        },
        "azure_monitor" => match normalized.as_str() {
            "CRITICAL" => Level::Critical,
            "ERROR" => Level::Error,
            "WARNING" => Level::Warn,
            "VERBOSE" => Level::Debug,
            _ => Level::Info,
        },
        _ => Level::parse(&normalized).unwrap_or(Level::Info),
    }
}

fn tag_metadata(provider: &str, mut metadata: HashMap<String, Value>) -> HashMap<String, Value> {
    metadata.insert("provider".to_string(), Value::String(provider.to_string()));
    metadata
}

/// builds a CloudLogEntry with the provider tag already stamped into
/// metadata, the shared step every concrete adapter funnels through.
pub fn build_entry(
    provider: &str,
    instant: DateTime<Utc>,
    raw_severity: &str,
    service_hint: Option<String>,
    message: String,
    metadata: HashMap<String, Value>,
) -> CloudLogEntry {
    CloudLogEntry {
        instant,
        severity: map_severity(provider, raw_severity),
        service_hint,
        message,
        metadata: tag_metadata(provider, metadata),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloudwatch_severity_mapping() {
        assert_eq!(map_severity("cloudwatch", "ERROR"), Level::Error);
        assert_eq!(map_severity("cloudwatch", "nonsense"), Level::Info);
    }

    #[test]
    fn gcp_critical_tiers_map_to_critical() {
        assert_eq!(map_severity("gcp_cloud_logging", "Alert"), Level::Critical);
    }

    #[test]
    fn build_entry_stamps_provider() {
        let entry = build_entry(
            "azure_monitor",
            Utc::now(),
            "Warning",
            Some("checkout".to_string()),
            "disk pressure".to_string(),
            HashMap::new(),
        );
        assert_eq!(entry.severity, Level::Warn);
        assert_eq!(
            entry.metadata.get("provider").and_then(|v| v.as_str()),
            Some("azure_monitor")
        );
    }
}
