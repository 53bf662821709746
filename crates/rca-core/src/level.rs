//! severity levels and the ordering used everywhere a group or span needs
//! a "worst level seen" computation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Warning,
    Error,
    Critical,
    Fatal,
}

impl Level {
    /// case-insensitive parse, with the common aliases the source formats use.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "dbg" | "trace" => Some(Level::Debug),
            "info" | "information" | "notice" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "warning" => Some(Level::Warning),
            "error" | "err" => Some(Level::Error),
            "critical" | "crit" => Some(Level::Critical),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
            Level::Fatal => "FATAL",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Level::Error | Level::Critical | Level::Fatal)
    }

    pub fn is_critical_or_fatal(&self) -> bool {
        matches!(self, Level::Critical | Level::Fatal)
    }

    /// rank used for ordering. WARN/WARNING tie, CRITICAL/FATAL tie — the
    /// spec leaves tie-break behavior between the two pairs unspecified
    /// when a group holds exactly one of each, so equal rank is correct
    /// and whichever instance sorts first in a stable sort wins.
    fn rank(&self) -> u8 {
        match self {
            Level::Debug => 0,
            Level::Info => 1,
            Level::Warn | Level::Warning => 2,
            Level::Error => 3,
            Level::Critical | Level::Fatal => 4,
        }
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.rank().cmp(&other.rank()))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}
