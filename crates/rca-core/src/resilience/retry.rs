//! exponential-backoff-with-jitter retry helper for flaky external calls.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_factor: f64,
    pub min_wait: Duration,
    pub max_wait: Duration,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: 1.0,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(30),
            jitter: true,
        }
    }
}

/// `wait = min(max_wait, min_wait * 2^attempt * backoff_factor)`, then
/// randomized to 50-100% of that value when jitter is enabled.
pub fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let min = config.min_wait.as_secs_f64();
    let max = config.max_wait.as_secs_f64();
    let wait = (min * 2f64.powi(attempt as i32) * config.backoff_factor).min(max);

    let wait = if config.jitter {
        let factor = 0.5 + rand::rng().random::<f64>() * 0.5;
        wait * factor
    } else {
        wait
    };

    Duration::from_secs_f64(wait.max(0.0))
}

/// retries a synchronous fallible closure, sleeping between attempts
/// with exponential backoff. returns the last error once `max_attempts`
/// is exhausted.
pub fn retry_sync<T, E>(config: &RetryConfig, mut f: impl FnMut(u32) -> Result<T, E>) -> Result<T, E> {
    let mut last_err = None;
    for attempt in 0..config.max_attempts {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt + 1 >= config.max_attempts {
                    return Err(e);
                }
                let wait = calculate_backoff(attempt, config);
                tracing::warn!(attempt = attempt + 1, max = config.max_attempts, wait_ms = wait.as_millis() as u64, "retrying after failure");
                std::thread::sleep(wait);
                last_err = Some(e);
            }
        }
    }
    Err(last_err.expect("max_attempts >= 1 guarantees at least one failed attempt was recorded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_respects_ceiling() {
        let config = RetryConfig {
            max_attempts: 10,
            backoff_factor: 1.0,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(5),
            jitter: false,
        };
        let wait = calculate_backoff(10, &config);
        assert!(wait <= Duration::from_secs(5));
    }

    #[test]
    fn backoff_grows_exponentially_without_jitter() {
        let config = RetryConfig {
            max_attempts: 10,
            backoff_factor: 1.0,
            min_wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(100),
            jitter: false,
        };
        let w0 = calculate_backoff(0, &config);
        let w1 = calculate_backoff(1, &config);
        let w2 = calculate_backoff(2, &config);
        assert_eq!(w0, Duration::from_secs(1));
        assert_eq!(w1, Duration::from_secs(2));
        assert_eq!(w2, Duration::from_secs(4));
    }

    #[test]
    fn retry_sync_gives_up_after_max_attempts() {
        let config = RetryConfig {
            max_attempts: 3,
            min_wait: Duration::from_millis(1),
            max_wait: Duration::from_millis(2),
            ..RetryConfig::default()
        };
        let mut calls = 0;
        let result: Result<(), &str> = retry_sync(&config, |_| {
            calls += 1;
            Err("still failing")
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn retry_sync_returns_first_success() {
        let config = RetryConfig::default();
        let mut calls = 0;
        let result: Result<i32, &str> = retry_sync(&config, |_| {
            calls += 1;
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }
}
