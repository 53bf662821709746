//! header-driven column -> field mapping, configurable delimiter.

use crate::error::Result;
use crate::event::{normalize, RawRecord};
use crate::ingestion::jsonl::LoadReport;
use crate::validation::validate_file_size;
use std::path::Path;

/// default header names recognized without an explicit mapping.
pub fn default_column_mapping() -> Vec<(&'static str, &'static str)> {
    vec![
        ("timestamp", "timestamp"),
        ("time", "timestamp"),
        ("service", "service"),
        ("component", "component"),
        ("severity", "level"),
        ("level", "level"),
        ("message", "message"),
        ("msg", "message"),
    ]
}

pub fn load_csv(
    path: impl AsRef<Path>,
    delimiter: u8,
    lenient: bool,
) -> Result<LoadReport> {
    validate_file_size(&path, None)?;
    let text = std::fs::read_to_string(&path)?;
    parse_csv(&text, delimiter, lenient)
}

pub fn parse_csv(text: &str, delimiter: u8, lenient: bool) -> Result<LoadReport> {
    let mapping = default_column_mapping();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut events = Vec::new();
    let mut skipped = 0;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                if lenient {
                    skipped += 1;
                    continue;
                }
                return Err(e.into());
            }
        };

        let mut raw: RawRecord = RawRecord::new();
        for (i, value) in record.iter().enumerate() {
            let Some(header) = headers.get(i) else {
                continue;
            };
            let field = mapping
                .iter()
                .find(|(col, _)| col.eq_ignore_ascii_case(header))
                .map(|(_, field)| *field)
                .unwrap_or(header.as_str());
            raw.insert(
                field.to_string(),
                serde_json::Value::String(value.to_string()),
            );
        }

        match normalize(raw) {
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
