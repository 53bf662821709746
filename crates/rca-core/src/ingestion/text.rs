//! line-oriented text formats: a fixed set of named regex patterns plus
//! an auto-detect mode that tries them in order, and a custom-regex
//! escape hatch that must clear the ReDoS validator before use.

use crate::event::Event;
use crate::level::Level;
use crate::security::regex_safety::validate_regex_safety;
use crate::error::{RcaError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Syslog,
    Nginx,
    Apache,
    Generic,
}

impl TextFormat {
    fn name(&self) -> &'static str {
        match self {
            TextFormat::Syslog => "syslog",
            TextFormat::Nginx => "nginx",
            TextFormat::Apache => "apache",
            TextFormat::Generic => "generic",
        }
    }
}

fn status_to_level(status: u16) -> Level {
    match status {
        500..=599 => Level::Error,
        400..=499 => Level::Warn,
        _ => Level::Info,
    }
}

fn syslog_pattern() -> &'static Regex {
    static P: OnceLock<Regex> = OnceLock::new();
    P.get_or_init(|| {
        Regex::new(r"^(?:<(\d+)>)?(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})\s+(\S+)\s+(\S+?)(?:\[(\d+)\])?:\s*(.+)$")
            .unwrap()
    })
}

fn nginx_error_pattern() -> &'static Regex {
    static P: OnceLock<Regex> = OnceLock::new();
    P.get_or_init(|| {
        Regex::new(r"^(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}) \[(\w+)\] (\d+)#\d+: (.+)$").unwrap()
    })
}

fn access_pattern() -> &'static Regex {
    static P: OnceLock<Regex> = OnceLock::new();
    P.get_or_init(|| {
        Regex::new(r#"^(\S+) \S+ \S+ \[([^\]]+)\] "(\S+) ([^"]*)" (\d+) (\d+)"#).unwrap()
    })
}

fn apache_error_pattern() -> &'static Regex {
    static P: OnceLock<Regex> = OnceLock::new();
    P.get_or_init(|| Regex::new(r"^\[([^\]]+)\] \[(\w+)\] (.+)$").unwrap())
}

fn parse_apache_error_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(ts, "%a %b %d %H:%M:%S %Y")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// RFC 3164 priority -> severity mapping, folded onto our level scale.
fn priority_to_level(priority: u8) -> Level {
    match priority % 8 {
        0..=3 => Level::Error,
        4 => Level::Warn,
        5 | 6 => Level::Info,
        _ => Level::Debug,
    }
}

fn parse_syslog_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let current_year = Utc::now().format("%Y").to_string();
    let with_year = format!("{ts} {current_year}");
    NaiveDateTime::parse_from_str(&with_year, "%b %d %H:%M:%S %Y")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

fn parse_nginx_error_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(ts, "%Y/%m/%d %H:%M:%S")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

fn parse_access_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(ts.split_whitespace().next().unwrap_or(ts), "%d/%b/%Y:%H:%M:%S")
        .ok()
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

fn try_syslog(line: &str) -> Option<Event> {
    let caps = syslog_pattern().captures(line)?;
    let priority: Option<u8> = caps.get(1).and_then(|m| m.as_str().parse().ok());
    let ts = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let process = caps.get(4).map(|m| m.as_str()).unwrap_or("");
    let message = caps.get(6).map(|m| m.as_str()).unwrap_or(line);

    Some(Event {
        timestamp: parse_syslog_timestamp(ts),
        service: Some(process.to_string()),
        level: Some(priority.map(priority_to_level).unwrap_or(Level::Info)),
        message: Some(message.to_string()),
        raw: HashMap::new(),
        metadata: HashMap::new(),
    })
}

fn try_nginx(line: &str) -> Option<Event> {
    if let Some(caps) = nginx_error_pattern().captures(line) {
        let ts = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let level_str = caps.get(2).map(|m| m.as_str()).unwrap_or("info");
        let message = caps.get(4).map(|m| m.as_str()).unwrap_or(line);
        return Some(Event {
            timestamp: parse_nginx_error_timestamp(ts),
            service: Some("nginx".to_string()),
            level: Some(Level::parse(level_str).unwrap_or(Level::Info)),
            message: Some(message.to_string()),
            raw: HashMap::new(),
            metadata: HashMap::new(),
        });
    }
    try_access(line, "nginx")
}

fn try_apache(line: &str) -> Option<Event> {
    if let Some(caps) = apache_error_pattern().captures(line) {
        let ts = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let level_str = caps.get(2).map(|m| m.as_str()).unwrap_or("info");
        let message = caps.get(3).map(|m| m.as_str()).unwrap_or(line);
        return Some(Event {
            timestamp: parse_apache_error_timestamp(ts),
            service: Some("apache".to_string()),
            level: Some(Level::parse(level_str).unwrap_or(Level::Info)),
            message: Some(message.to_string()),
            raw: HashMap::new(),
            metadata: HashMap::new(),
        });
    }
    try_access(line, "apache")
}

fn try_access(line: &str, service: &str) -> Option<Event> {
    let caps = access_pattern().captures(line)?;
    let ts = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let method = caps.get(3).map(|m| m.as_str()).unwrap_or("");
    let path = caps.get(4).map(|m| m.as_str()).unwrap_or("");
    let status: u16 = caps.get(5).and_then(|m| m.as_str().parse().ok()).unwrap_or(200);
    let size = caps.get(6).map(|m| m.as_str()).unwrap_or("0");

    Some(Event {
        timestamp: parse_access_timestamp(ts),
        service: Some(service.to_string()),
        level: Some(status_to_level(status)),
        message: Some(format!("{method} {path} {status} {size}")),
        raw: HashMap::new(),
        metadata: HashMap::new(),
    })
}

fn try_generic(line: &str) -> Option<Event> {
    if line.trim().is_empty() {
        return None;
    }
    Some(Event {
        timestamp: None,
        service: None,
        level: None,
        message: Some(line.to_string()),
        raw: HashMap::new(),
        metadata: HashMap::new(),
    })
}

fn dispatch(format: TextFormat, line: &str) -> Option<Event> {
    match format {
        TextFormat::Syslog => try_syslog(line),
        TextFormat::Nginx => try_nginx(line),
        TextFormat::Apache => try_apache(line),
        TextFormat::Generic => try_generic(line),
    }
}

/// auto-detect tries the named formats in this fixed order, falling
/// back to the generic one-line-one-message parse.
const AUTO_ORDER: &[TextFormat] = &[
    TextFormat::Syslog,
    TextFormat::Nginx,
    TextFormat::Apache,
    TextFormat::Generic,
];

pub fn parse_text(text: &str, format: Option<TextFormat>) -> Vec<Event> {
    let mut events = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let event = match format {
            Some(fmt) => dispatch(fmt, line).or_else(|| try_generic(line)),
            None => AUTO_ORDER.iter().find_map(|fmt| dispatch(*fmt, line)),
        };
        if let Some(event) = event {
            events.push(event);
        }
    }
    events
}

/// a user-supplied regex with named capture groups `message`, and
/// optionally `timestamp`, `service`, `level`. rejected with
/// UnsafeRegex if it fails the backtracking-safety check.
pub fn parse_text_custom(text: &str, pattern: &str) -> Result<Vec<Event>> {
    let safe = validate_regex_safety(pattern, Duration::from_millis(200))?;
    if !safe {
        return Err(RcaError::UnsafeRegex(format!(
            "pattern did not clear the bounded match test: {pattern}"
        )));
    }
    let re = Regex::new(pattern)?;

    let mut events = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some(caps) = re.captures(line) else {
            continue;
        };
        let message = caps
            .name("message")
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| line.to_string());
        let timestamp = caps
            .name("timestamp")
            .and_then(|m| DateTime::parse_from_rfc3339(m.as_str()).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let service = caps.name("service").map(|m| m.as_str().to_string());
        let level = caps.name("level").and_then(|m| Level::parse(m.as_str()));

        events.push(Event {
            timestamp,
            service,
            level,
            message: Some(message),
            raw: HashMap::new(),
            metadata: HashMap::new(),
        });
    }
    Ok(events)
}

pub fn format_name(format: TextFormat) -> &'static str {
    format.name()
}
