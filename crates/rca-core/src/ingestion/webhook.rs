//! inbound alert/event webhooks: HMAC-SHA256 verification against a
//! per-source secret, plus a bounded ring buffer of recently received
//! events for replay/debugging.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::collections::{HashMap, VecDeque};

type HmacSha256 = Hmac<Sha256>;

/// header names recognized across the common webhook providers, tried
/// in this order when the caller doesn't pin one down.
pub const SIGNATURE_HEADERS: &[&str] = &[
    "X-Hub-Signature-256",
    "X-Datadog-Signature",
    "X-Slack-Signature",
    "X-PagerDuty-Signature",
    "X-Webhook-Signature",
];

#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub source: String,
    pub payload: Value,
    pub verified: bool,
}

/// canonicalizes a JSON value by recursively sorting object keys, so
/// the HMAC is computed over a stable byte representation regardless
/// of the sender's field ordering.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<(String, Value)> =
                map.iter().map(|(k, v)| (k.clone(), canonicalize(v))).collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

fn strip_prefix(signature: &str) -> &str {
    signature.strip_prefix("sha256=").unwrap_or(signature)
}

/// constant-time hex comparison via the hmac crate's own verification,
/// avoiding a hand-rolled byte compare that could short-circuit early.
pub fn verify_signature(secret: &[u8], payload: &Value, signature_header: &str) -> bool {
    let canonical = canonicalize(payload);
    let Ok(bytes) = serde_json::to_vec(&canonical) else {
        return false;
    };
    let Ok(expected_hex) = hex::decode(strip_prefix(signature_header)) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(&bytes);
    mac.verify_slice(&expected_hex).is_ok()
}

pub struct WebhookReceiver {
    secrets: HashMap<String, Vec<u8>>,
    history: VecDeque<WebhookEvent>,
    capacity: usize,
}

impl WebhookReceiver {
    pub fn new(capacity: usize) -> Self {
        Self {
            secrets: HashMap::new(),
            history: VecDeque::new(),
            capacity,
        }
    }

    pub fn register_secret(&mut self, source: impl Into<String>, secret: impl Into<Vec<u8>>) {
        self.secrets.insert(source.into(), secret.into());
    }

    /// verifies against a registered secret when one exists for the
    /// source; sources with no registered secret are accepted
    /// unverified. always stores the event, dropping 10% of the
    /// oldest history once the ring buffer fills.
    pub fn receive(
        &mut self,
        source: impl Into<String>,
        payload: Value,
        signature_header: Option<&str>,
    ) -> WebhookEvent {
        let source = source.into();
        let verified = match (self.secrets.get(&source), signature_header) {
            (Some(secret), Some(sig)) => verify_signature(secret, &payload, sig),
            (Some(_), None) => false,
            (None, _) => false,
        };

        let event = WebhookEvent {
            source,
            payload,
            verified,
        };
        self.push_history(event.clone());
        event
    }

    fn push_history(&mut self, event: WebhookEvent) {
        if self.history.len() >= self.capacity {
            let drop_count = (self.capacity / 10).max(1);
            for _ in 0..drop_count {
                self.history.pop_front();
            }
        }
        self.history.push_back(event);
    }

    pub fn history(&self) -> &VecDeque<WebhookEvent> {
        &self.history
    }
}

impl Clone for WebhookEvent {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            payload: self.payload.clone(),
            verified: self.verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn verifies_matching_signature() {
        let secret = b"topsecret";
        let payload = json!({"b": 2, "a": 1});
        let canonical = canonicalize(&payload);
        let bytes = serde_json::to_vec(&canonical).unwrap();
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(&bytes);
        let tag = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature(secret, &payload, &format!("sha256={tag}")));
        assert!(verify_signature(secret, &payload, &tag));
    }

    #[test]
    fn rejects_tampered_payload() {
        let secret = b"topsecret";
        let payload = json!({"a": 1});
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(b"something else");
        let tag = hex::encode(mac.finalize().into_bytes());
        assert!(!verify_signature(secret, &payload, &tag));
    }

    #[test]
    fn unverified_without_registered_secret() {
        let mut receiver = WebhookReceiver::new(10);
        let event = receiver.receive("unknown-source", json!({"x": 1}), None);
        assert!(!event.verified);
    }

    #[test]
    fn ring_buffer_drops_ten_percent_on_overflow() {
        let mut receiver = WebhookReceiver::new(10);
        for i in 0..10 {
            receiver.receive("s", json!({"i": i}), None);
        }
        assert_eq!(receiver.history().len(), 10);
        receiver.receive("s", json!({"i": 10}), None);
        assert_eq!(receiver.history().len(), 10);
    }
}
