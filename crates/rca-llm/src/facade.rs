//! wraps the heuristic analyzer with an optional LLM-generated
//! narrative. the heuristic result is always computed first and is
//! always the fallback: a missing provider, a timed-out call, or an
//! open circuit degrades to the heuristic summary rather than failing
//! the whole analysis.

use crate::llm_client::{LlmClient, LlmError};
use rca_core::analyzer::{analyze_incident, AnalysisResult};
use rca_core::grouping::IncidentGroup;
use rca_core::resilience::{calculate_backoff, CircuitBreaker, CircuitBreakerConfig, RetryConfig};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// mirrors the provider/prompt contract: the façade never depends on
/// a specific vendor, only on `LlmClient::generate`.
pub struct CausalReasoningFacade {
    client: Option<Arc<dyn LlmClient>>,
    breaker: CircuitBreaker,
    retry: RetryConfig,
    call_timeout: Duration,
}

impl CausalReasoningFacade {
    /// `client: None` runs heuristic-only, useful for offline/CI paths
    /// where no provider is configured.
    pub fn new(client: Option<Arc<dyn LlmClient>>) -> Self {
        Self {
            client,
            breaker: CircuitBreaker::new("llm-facade", CircuitBreakerConfig::default()),
            retry: RetryConfig {
                max_attempts: 3,
                backoff_factor: 1.0,
                min_wait: Duration::from_millis(50),
                max_wait: Duration::from_millis(500),
                jitter: true,
            },
            call_timeout: rca_core::constants::LLM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// runs the heuristic analyzer, then tries to enrich
    /// `incident_summary` with the LLM's narrative. `metadata.llm_analysis`
    /// always reflects whether the enrichment actually happened.
    pub async fn analyze(&self, group: &IncidentGroup) -> AnalysisResult {
        let mut result = analyze_incident(group);
        if group.is_empty() {
            return result;
        }

        let Some(client) = &self.client else {
            return result;
        };

        match self.narrate(client.as_ref(), &result).await {
            Ok(narrative) => {
                result.incident_summary = narrative;
                result
                    .metadata
                    .insert("llm_analysis".to_string(), Value::Bool(true));
            }
            Err(e) => {
                tracing::warn!(error = %e, "llm enrichment unavailable, keeping heuristic summary");
                result
                    .metadata
                    .insert("llm_analysis".to_string(), Value::Bool(false));
            }
        }

        result
    }

    async fn narrate(
        &self,
        client: &dyn LlmClient,
        result: &AnalysisResult,
    ) -> Result<String, LlmError> {
        let prompt = build_prompt(result);

        let mut last_err = None;
        for attempt in 0..self.retry.max_attempts {
            self.breaker
                .guard()
                .map_err(|e| LlmError::ApiError(e.to_string()))?;

            if attempt > 0 {
                sleep(calculate_backoff(attempt, &self.retry)).await;
            }

            match timeout(self.call_timeout, client.generate(&prompt)).await {
                Ok(Ok(text)) => {
                    self.breaker.on_success();
                    return Ok(text.trim().to_string());
                }
                Ok(Err(e)) => {
                    self.breaker.on_failure();
                    last_err = Some(e);
                }
                Err(_) => {
                    self.breaker.on_failure();
                    last_err = Some(LlmError::RequestFailed("timed out".to_string()));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| LlmError::ApiError("no attempts made".to_string())))
    }
}

/// exposed so callers can log/inspect exactly what would be sent
/// without triggering an actual provider call.
pub fn build_prompt(result: &AnalysisResult) -> String {
    let causes = result
        .root_causes
        .iter()
        .map(|c| format!("- {} (confidence {:.0}%)", c.description, c.confidence * 100.0))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are investigating a production incident.\n\n\
Heuristic summary: {}\n\
Affected services: {}\n\
Event count: {}\n\
Candidate root causes:\n{}\n\n\
Write 2-3 sentences explaining what most likely happened and why, \
in plain language an on-call engineer can act on immediately.",
        result.incident_summary,
        result.affected_services.join(", "),
        result.event_count,
        causes,
    )
}
