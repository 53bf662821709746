//! rejects regex patterns that are either syntactically known-bad
//! (nested quantifiers) or empirically slow against a pathological input.
//!
//! the original's timeout used `signal.alarm` to interrupt a runaway
//! match; Rust has no portable way to interrupt a thread mid-computation,
//! so the bounded match instead runs on a scratch thread and the caller
//! waits on it with `recv_timeout`. the scratch thread is abandoned (not
//! joined) if it doesn't finish in time -- acceptable here since this
//! path only runs against operator-supplied custom patterns, not per-event.

use crate::error::{RcaError, Result};
use regex::Regex;
use std::sync::mpsc;
use std::time::Duration;

const DANGEROUS_CONSTRUCTS: &[&str] = &[
    r"\(\w+\)\+",
    r"\(\w+\)\*",
    r"\(\.\*\)\+",
    r"\(\.\+\)\+",
];

/// syntactic check + a bounded match against a pathological input.
/// returns `Err` for patterns that fail either check or don't compile.
pub fn validate_regex_safety(pattern: &str, timeout: Duration) -> Result<bool> {
    for dangerous in DANGEROUS_CONSTRUCTS {
        let checker = Regex::new(dangerous).expect("static pattern is valid");
        if checker.is_match(pattern) {
            return Err(RcaError::UnsafeRegex(format!(
                "pattern contains potentially dangerous construct: {dangerous}"
            )));
        }
    }

    let compiled = Regex::new(pattern)?;

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let test_input = "a".repeat(100);
        let start = std::time::Instant::now();
        let _ = compiled.is_match(&test_input);
        let _ = tx.send(start.elapsed());
    });

    match rx.recv_timeout(timeout) {
        Ok(elapsed) if elapsed > timeout / 2 => Ok(false),
        Ok(_) => Ok(true),
        Err(mpsc::RecvTimeoutError::Timeout) => Ok(false),
        Err(mpsc::RecvTimeoutError::Disconnected) => Ok(false),
    }
}
