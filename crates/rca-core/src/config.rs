//! engine configuration: a TOML file for the structural defaults, with
//! a handful of environment variables layered on top for the knobs an
//! operator tends to want to flip without editing a file.

use crate::error::{RcaError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_llm_provider")]
    pub llm_provider: String,

    #[serde(default)]
    pub llm_model: String,

    #[serde(default = "default_max_events")]
    pub max_events: usize,

    #[serde(default = "default_time_window_minutes")]
    pub time_window_minutes: u64,

    #[serde(default)]
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestionConfig {
    #[serde(default)]
    pub lenient: bool,

    #[serde(default)]
    pub max_file_size_bytes: Option<u64>,
}

fn default_llm_provider() -> String {
    "none".to_string()
}

fn default_max_events() -> usize {
    5000
}

fn default_time_window_minutes() -> u64 {
    15
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            llm_provider: default_llm_provider(),
            llm_model: String::new(),
            max_events: default_max_events(),
            time_window_minutes: default_time_window_minutes(),
            ingestion: IngestionConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_events == 0 {
            return Err(RcaError::Configuration(
                "max_events must be positive".to_string(),
            ));
        }
        if self.time_window_minutes == 0 {
            return Err(RcaError::Configuration(
                "time_window_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// applies the `RCA_*` environment overrides on top of whatever the
    /// file set, logging (not failing) on a malformed value the same
    /// way the reference loader falls back to the existing default.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(provider) = std::env::var("RCA_LLM_PROVIDER") {
            self.llm_provider = provider;
        }
        if let Ok(model) = std::env::var("RCA_LLM_MODEL") {
            self.llm_model = model;
        }
        if let Some(v) = positive_int_env("RCA_MAX_EVENTS") {
            self.max_events = v;
        }
        if let Some(v) = positive_int_env("RCA_TIME_WINDOW") {
            self.time_window_minutes = v as u64;
        }
        self
    }
}

fn positive_int_env(key: &str) -> Option<usize> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<i64>() {
        Ok(v) if v > 0 => Some(v as usize),
        Ok(v) => {
            warn!(key, value = v, "must be positive, ignoring override");
            None
        }
        Err(_) => {
            warn!(key, value = %raw, "not a valid integer, ignoring override");
            None
        }
    }
}

/// loads and validates config from a TOML file, then layers env
/// overrides on top.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    let config = config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = EngineConfig::default();
        assert_eq!(config.llm_provider, "none");
        assert_eq!(config.max_events, 5000);
        assert_eq!(config.time_window_minutes, 15);
        config.validate().unwrap();
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let toml_content = "max_events = 100\n";
        let config: EngineConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.max_events, 100);
        assert_eq!(config.time_window_minutes, 15);
    }

    #[test]
    fn rejects_zero_max_events() {
        let config = EngineConfig {
            max_events: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
