//! statistical outlier detection over a scalar metric history. three
//! interchangeable methods, all sharing the same insufficient-history
//! contract and a [0, 1] score/confidence scale.

use crate::constants::{
    ANOMALY_CONFIDENCE_CAP_AT, ANOMALY_MIN_HISTORY, DEFAULT_ZSCORE_SENSITIVITY,
    MOVING_AVERAGE_WINDOW,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatisticalMethod {
    ZScore,
    Iqr,
    MovingAverage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub is_anomaly: bool,
    pub score: f64,
    pub method: StatisticalMethod,
    pub baseline: Option<f64>,
    pub actual_value: f64,
    pub threshold: Option<f64>,
    pub confidence: f64,
    pub reason: Option<String>,
}

fn insufficient_data(method: StatisticalMethod, value: f64) -> AnomalyResult {
    AnomalyResult {
        is_anomaly: false,
        score: 0.0,
        method,
        baseline: None,
        actual_value: value,
        threshold: None,
        confidence: 0.0,
        reason: Some("insufficient_data".to_string()),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// sample standard deviation (n-1 denominator), matching the original's
/// use of `statistics.stdev`. a single-point sample has no sample stdev.
fn sample_stddev(values: &[f64], m: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// `zscore = |value - mean| / stdev`, anomaly when `zscore > sensitivity`.
/// a zero stdev (constant history) falls back to a small epsilon
/// comparison rather than a division. score saturates at 1.0 at 5σ.
pub fn detect_zscore(history: &[f64], value: f64, sensitivity: f64) -> AnomalyResult {
    if history.len() < ANOMALY_MIN_HISTORY {
        return insufficient_data(StatisticalMethod::ZScore, value);
    }
    let m = mean(history);
    let sd = sample_stddev(history, m);

    let (zscore, is_anomaly, score) = if sd == 0.0 {
        let anomaly = (value - m).abs() > 0.01;
        (0.0, anomaly, if anomaly { 1.0 } else { 0.0 })
    } else {
        let z = (value - m).abs() / sd;
        (z, z > sensitivity, (z / 5.0).min(1.0))
    };

    AnomalyResult {
        is_anomaly,
        score,
        method: StatisticalMethod::ZScore,
        baseline: Some(m),
        actual_value: value,
        threshold: Some(sensitivity),
        confidence: (history.len() as f64 / ANOMALY_CONFIDENCE_CAP_AT as f64).min(1.0),
        reason: if is_anomaly {
            Some(format!(
                "z-score {zscore:.2} exceeds sensitivity {sensitivity:.2}"
            ))
        } else {
            None
        },
    }
}

/// Tukey-fence style check: quartiles taken by index (`n/4`, `3n/4` on
/// sorted history, integer division) rather than interpolated —
/// matches the reference tool's simple percentile scheme.
pub fn detect_iqr(history: &[f64], value: f64, sensitivity: f64) -> AnomalyResult {
    if history.len() < ANOMALY_MIN_HISTORY {
        return insufficient_data(StatisticalMethod::Iqr, value);
    }
    let mut sorted = history.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();

    let q1 = sorted[n / 4];
    let q3 = sorted[3 * n / 4];
    let iqr = q3 - q1;

    let lower = q1 - sensitivity * iqr;
    let upper = q3 + sensitivity * iqr;
    let is_anomaly = value < lower || value > upper;

    let score = if value < lower {
        ((lower - value) / (iqr * 3.0)).min(1.0)
    } else if value > upper {
        ((value - upper) / (iqr * 3.0)).min(1.0)
    } else {
        0.0
    };

    AnomalyResult {
        is_anomaly,
        score,
        method: StatisticalMethod::Iqr,
        baseline: Some(median(&sorted)),
        actual_value: value,
        threshold: Some(sensitivity),
        confidence: (history.len() as f64 / ANOMALY_CONFIDENCE_CAP_AT as f64).min(1.0),
        reason: if is_anomaly {
            Some(format!(
                "value {value:.2} outside fence [{lower:.2}, {upper:.2}]"
            ))
        } else {
            None
        },
    }
}

/// compares value against the mean of the trailing `window` history
/// points rather than the full history, same trigger as z-score.
pub fn detect_moving_average(
    history: &[f64],
    value: f64,
    window: usize,
    sensitivity: f64,
) -> AnomalyResult {
    if history.len() < ANOMALY_MIN_HISTORY {
        return insufficient_data(StatisticalMethod::MovingAverage, value);
    }
    let start = history.len().saturating_sub(window);
    let recent = &history[start..];
    let m = mean(recent);
    let sd = sample_stddev(recent, m);

    let (is_anomaly, score) = if sd == 0.0 {
        let anomaly = (value - m).abs() > 0.01;
        (anomaly, if anomaly { 1.0 } else { 0.0 })
    } else {
        let deviation = (value - m).abs() / sd;
        (deviation > sensitivity, (deviation / 5.0).min(1.0))
    };

    AnomalyResult {
        is_anomaly,
        score,
        method: StatisticalMethod::MovingAverage,
        baseline: Some(m),
        actual_value: value,
        threshold: Some(sensitivity),
        confidence: (history.len() as f64 / 50.0).min(1.0),
        reason: if is_anomaly {
            Some(format!(
                "value {:.2} deviates from {}-point moving average {:.2}",
                value,
                recent.len(),
                m
            ))
        } else {
            None
        },
    }
}

pub struct AnomalyDetector {
    pub sensitivity: f64,
    pub window: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_ZSCORE_SENSITIVITY,
            window: MOVING_AVERAGE_WINDOW,
        }
    }
}

impl AnomalyDetector {
    pub fn new(sensitivity: f64, window: usize) -> Self {
        Self { sensitivity, window }
    }

    pub fn detect(&self, method: StatisticalMethod, history: &[f64], value: f64) -> AnomalyResult {
        match method {
            StatisticalMethod::ZScore => detect_zscore(history, value, self.sensitivity),
            StatisticalMethod::Iqr => detect_iqr(history, value, self.sensitivity),
            StatisticalMethod::MovingAverage => {
                detect_moving_average(history, value, self.window, self.sensitivity)
            }
        }
    }
}
