//! normative defaults pulled straight from the component design section.
//! nothing here should drift without a matching change to the spec.

use std::time::Duration;

/// window within which two service errors are considered causally linked.
pub const CAUSAL_WINDOW: Duration = Duration::from_secs(5 * 60);

/// span duration above which a span counts as "slow".
pub const SLOW_SPAN_THRESHOLD_MS: i64 = 1000;

/// max gap between consecutive error spans still counted as one propagation hop.
pub const ERROR_WINDOW_MS: i64 = 100;

/// fraction of events a single repeated message must reach to become its own hypothesis.
pub const REPEATED_ERROR_THRESHOLD: f64 = 0.5;

pub const CONFIDENCE_HIGH: f64 = 0.8;
pub const CONFIDENCE_MEDIUM: f64 = 0.5;
pub const CONFIDENCE_LOW: f64 = 0.3;

pub const PRIORITY_CRITICAL: u8 = 1;
pub const PRIORITY_HIGH: u8 = 2;
pub const PRIORITY_MEDIUM: u8 = 3;
pub const PRIORITY_LOW: u8 = 4;

/// default hard ceiling on ingested file size.
pub const MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// lower bound on how many parsed timestamps the cache must retain.
pub const TIMESTAMP_PARSE_CACHE_MIN: usize = 1024;

/// default minimum history length before the anomaly detector will commit to a verdict.
pub const ANOMALY_MIN_HISTORY: usize = 10;

/// default sliding window width for the moving-average method.
pub const MOVING_AVERAGE_WINDOW: usize = 10;

/// anomaly confidence reaches 1.0 once the history is at least this long.
pub const ANOMALY_CONFIDENCE_CAP_AT: usize = 100;

/// default z-score sensitivity.
pub const DEFAULT_ZSCORE_SENSITIVITY: f64 = 2.0;

/// top-K most common error messages tracked per incident group.
pub const TOP_K_ERRORS: usize = 5;

/// default webhook receive timeout.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// default LLM call timeout.
pub const LLM_TIMEOUT: Duration = Duration::from_secs(30);
