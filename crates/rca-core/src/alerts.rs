//! groups related alerts by source/severity/tag within a time window, and
//! suppresses duplicates within a group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub source: String,
    pub severity: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct CorrelationRule {
    pub window: std::time::Duration,
    pub min_alerts: usize,
    pub group_by_tags: Vec<String>,
    pub group_by_source: bool,
}

impl Default for CorrelationRule {
    fn default() -> Self {
        Self {
            window: std::time::Duration::from_secs(60),
            min_alerts: 1,
            group_by_tags: Vec::new(),
            group_by_source: true,
        }
    }
}

/// `source:<source>|<tag>:<value>|...|severity:<severity>` (source
/// segment only present when `group_by_source`), tags sorted by key for
/// a stable key regardless of insertion order. a tag absent on the
/// alert still contributes its key, with value "unknown".
fn group_key(alert: &Alert, rule: &CorrelationRule) -> String {
    let mut parts = Vec::new();
    if rule.group_by_source {
        parts.push(format!("source:{}", alert.source));
    }
    let mut tag_keys: Vec<&String> = rule.group_by_tags.iter().collect();
    tag_keys.sort();
    for tag in tag_keys {
        let value = alert
            .tags
            .get(tag)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        parts.push(format!("{}:{}", tag, value));
    }
    parts.push(format!("severity:{}", alert.severity));
    parts.join("|")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertGroup {
    pub key: String,
    pub alerts: Vec<Alert>,
}

impl AlertGroup {
    pub fn count(&self) -> usize {
        self.alerts.len()
    }

    pub fn dominant_source(&self) -> Option<String> {
        dominant(self.alerts.iter().map(|a| a.source.clone()))
    }

    pub fn dominant_severity(&self) -> Option<String> {
        dominant(self.alerts.iter().map(|a| a.severity.clone()))
    }

    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.alerts.iter().map(|a| a.timestamp).min()
    }

    pub fn latest(&self) -> Option<DateTime<Utc>> {
        self.alerts.iter().map(|a| a.timestamp).max()
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.earliest(), self.latest()) {
            (Some(e), Some(l)) => Some(l - e),
            _ => None,
        }
    }

    pub fn severity_histogram(&self) -> HashMap<String, usize> {
        histogram(self.alerts.iter().map(|a| a.severity.clone()))
    }

    pub fn source_histogram(&self) -> HashMap<String, usize> {
        histogram(self.alerts.iter().map(|a| a.source.clone()))
    }

    /// keep the earliest alert in the group, suppress the rest. when
    /// `keep_first` is false, every alert in the group is suppressed.
    pub fn suppressed(&self, keep_first: bool) -> Vec<&Alert> {
        if self.alerts.is_empty() {
            return Vec::new();
        }
        if !keep_first {
            return self.alerts.iter().collect();
        }
        let mut sorted: Vec<&Alert> = self.alerts.iter().collect();
        sorted.sort_by_key(|a| a.timestamp);
        sorted.into_iter().skip(1).collect()
    }
}

fn histogram(items: impl Iterator<Item = String>) -> HashMap<String, usize> {
    let mut h = HashMap::new();
    for item in items {
        *h.entry(item).or_insert(0) += 1;
    }
    h
}

fn dominant(items: impl Iterator<Item = String>) -> Option<String> {
    let hist = histogram(items);
    hist.into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(k, _)| k)
}

pub struct AlertCorrelator {
    pub rule: CorrelationRule,
}

impl AlertCorrelator {
    pub fn new(rule: CorrelationRule) -> Self {
        Self { rule }
    }

    /// groups alerts that share a key and fall within `window` of the
    /// group's running end time (a group extends as long as the next
    /// same-key alert arrives before the window elapses since the last
    /// member, not just the first).
    pub fn correlate(&self, mut alerts: Vec<Alert>) -> Vec<AlertGroup> {
        alerts.sort_by_key(|a| a.timestamp);

        let window = chrono::Duration::from_std(self.rule.window)
            .unwrap_or_else(|_| chrono::Duration::days(3650));

        let mut open: HashMap<String, AlertGroup> = HashMap::new();
        let mut finished: Vec<AlertGroup> = Vec::new();

        for alert in alerts {
            let key = group_key(&alert, &self.rule);
            match open.get_mut(&key) {
                Some(group) => {
                    let last = group.alerts.last().unwrap().timestamp;
                    if alert.timestamp - last <= window {
                        group.alerts.push(alert);
                    } else {
                        let finished_group = open.remove(&key).unwrap();
                        finished.push(finished_group);
                        open.insert(
                            key.clone(),
                            AlertGroup {
                                key,
                                alerts: vec![alert],
                            },
                        );
                    }
                }
                None => {
                    open.insert(
                        key.clone(),
                        AlertGroup {
                            key,
                            alerts: vec![alert],
                        },
                    );
                }
            }
        }
        finished.extend(open.into_values());

        finished.retain(|g| g.count() >= self.rule.min_alerts);
        finished.sort_by_key(|g| g.earliest());
        finished
    }
}

/// weighted similarity between two alerts: 0.3 matching source, 0.2
/// matching severity, 0.5 * jaccard overlap of tag keys present on both.
pub fn calculate_similarity(a: &Alert, b: &Alert) -> f64 {
    let mut score = 0.0;
    if a.source == b.source {
        score += 0.3;
    }
    if a.severity == b.severity {
        score += 0.2;
    }

    let a_tags: HashSet<(&String, &String)> = a.tags.iter().collect();
    let b_tags: HashSet<(&String, &String)> = b.tags.iter().collect();
    let union = a_tags.union(&b_tags).count();
    if union > 0 {
        let intersection = a_tags.intersection(&b_tags).count();
        score += 0.5 * (intersection as f64 / union as f64);
    }

    score
}

pub fn find_similar_alerts<'a>(target: &Alert, pool: &'a [Alert], threshold: f64) -> Vec<&'a Alert> {
    pool.iter()
        .filter(|a| a.id != target.id && calculate_similarity(target, a) >= threshold)
        .collect()
}
