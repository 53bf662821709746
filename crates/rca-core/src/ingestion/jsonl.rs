//! one JSON object per non-empty line.

use crate::error::{RcaError, Result};
use crate::event::{normalize, Event, RawRecord};
use crate::validation::validate_file_size;
use std::path::Path;

pub struct LoadReport {
    pub events: Vec<Event>,
    pub skipped: usize,
}

/// lenient mode accumulates a skip count for malformed lines/records;
/// strict mode surfaces the first failure.
pub fn load_jsonl(path: impl AsRef<Path>, lenient: bool) -> Result<LoadReport> {
    validate_file_size(&path, None)?;
    let text = std::fs::read_to_string(&path)?;
    parse_jsonl(&text, lenient)
}

pub fn parse_jsonl(text: &str, lenient: bool) -> Result<LoadReport> {
    let mut events = Vec::new();
    let mut skipped = 0;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<serde_json::Value>(line) {
            Ok(serde_json::Value::Object(map)) => {
                let raw: RawRecord = map.into_iter().collect();
                raw
            }
            Ok(_) => {
                if lenient {
                    skipped += 1;
                    continue;
                }
                return Err(RcaError::InvalidFormat(format!(
                    "line is not a JSON object: {line}"
                )));
            }
            Err(e) => {
                if lenient {
                    skipped += 1;
                    continue;
                }
                return Err(RcaError::Parse(format!("invalid JSON line: {e}")));
            }
        };

        match normalize(record) {
            Ok(event) => events.push(event),
            Err(e) => {
                if lenient {
                    skipped += 1;
                } else {
                    return Err(e);
                }
            }
        }
    }

    Ok(LoadReport { events, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_skips_invalid_lines_and_counts_them() {
        let text = "\
{\"service\": \"api\", \"level\": \"error\", \"message\": \"boom\"}
not json at all
{\"service\": \"db\", \"message\": \"ok\"}

[1, 2, 3]
";
        let report = parse_jsonl(text, true).unwrap();
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.skipped, 2);
    }

    #[test]
    fn strict_surfaces_first_failure() {
        let text = "not json\n{\"service\": \"api\"}\n";
        assert!(parse_jsonl(text, false).is_err());
    }
}
