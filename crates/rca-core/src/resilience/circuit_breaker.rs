//! three-state (CLOSED/OPEN/HALF_OPEN) circuit breaker guarding calls to
//! an external collaborator (LLM provider, cloud log API, webhook sink).

use crate::error::RcaError;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
}

pub struct CircuitBreaker {
    pub name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().unwrap().failure_count
    }

    fn should_attempt_reset(&self, inner: &Inner) -> bool {
        inner.state == CircuitState::Open
            && inner
                .last_failure
                .map(|t| t.elapsed() >= self.config.timeout)
                .unwrap_or(false)
    }

    fn before_call(&self) -> Result<(), RcaError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.state == CircuitState::Closed {
            return Ok(());
        }
        if self.should_attempt_reset(&inner) {
            inner.state = CircuitState::HalfOpen;
            inner.success_count = 0;
            tracing::info!(breaker = %self.name, "half-open: testing recovery");
            return Ok(());
        }
        if inner.state == CircuitState::Open {
            return Err(RcaError::CircuitOpen);
        }
        Ok(())
    }

    fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failure_count = 0;
        if inner.state == CircuitState::HalfOpen {
            inner.success_count += 1;
            if inner.success_count >= self.config.success_threshold {
                inner.state = CircuitState::Closed;
                inner.success_count = 0;
                tracing::info!(breaker = %self.name, "closed: recovered");
            }
        }
    }

    fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failure_count += 1;
        inner.last_failure = Some(Instant::now());
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Open;
            inner.success_count = 0;
            tracing::warn!(breaker = %self.name, "open: recovery attempt failed");
        } else if inner.failure_count >= self.config.failure_threshold {
            inner.state = CircuitState::Open;
            tracing::error!(breaker = %self.name, threshold = self.config.failure_threshold, "open: failure threshold exceeded");
        }
    }

    /// runs `f`, tracking the result against the breaker's state machine.
    /// returns `RcaError::CircuitOpen` without calling `f` at all while open.
    pub fn call<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, RcaError>
    where
        RcaError: From<E>,
    {
        self.before_call()?;
        match f() {
            Ok(v) => {
                self.record_success();
                Ok(v)
            }
            Err(e) => {
                self.record_failure();
                Err(RcaError::from(e))
            }
        }
    }

    /// same state check as `call`'s entry gate, exposed directly for
    /// callers driving an async future themselves (`call` can't own a
    /// `Future`, only an `FnOnce` closure).
    pub fn guard(&self) -> Result<(), RcaError> {
        self.before_call()
    }

    pub fn on_success(&self) {
        self.record_success();
    }

    pub fn on_failure(&self) {
        self.record_failure();
    }

    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.success_count = 0;
        inner.last_failure = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 2,
            success_threshold: 1,
            timeout: Duration::from_millis(10),
        }
    }

    #[test]
    fn opens_after_threshold_failures() {
        let breaker = CircuitBreaker::new("test", cfg());
        for _ in 0..2 {
            let _ = breaker.call::<(), RcaError>(|| Err(RcaError::Validation("boom".into())));
        }
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn open_circuit_short_circuits_without_calling() {
        let breaker = CircuitBreaker::new("test", cfg());
        for _ in 0..2 {
            let _ = breaker.call::<(), RcaError>(|| Err(RcaError::Validation("boom".into())));
        }
        let result = breaker.call::<(), RcaError>(|| Ok(()));
        assert!(matches!(result, Err(RcaError::CircuitOpen)));
    }

    #[test]
    fn half_open_recovers_to_closed_on_success() {
        let breaker = CircuitBreaker::new("test", cfg());
        for _ in 0..2 {
            let _ = breaker.call::<(), RcaError>(|| Err(RcaError::Validation("boom".into())));
        }
        std::thread::sleep(Duration::from_millis(20));
        let result = breaker.call::<(), RcaError>(|| Ok(()));
        assert!(result.is_ok());
        assert_eq!(breaker.state(), CircuitState::Closed);
    }
}
