//! ingestion adapters: one per wire/file format, converging on the
//! normalized Event (or, for trace payloads, Span) types. `registry()`
//! maps a format tag or a file extension onto the adapter that
//! handles it, auto-detecting by extension when the caller doesn't
//! pin one down.

pub mod cloud;
pub mod csv;
pub mod jsonl;
pub mod otlp;
pub mod text;
pub mod webhook;

pub use jsonl::LoadReport;
pub use text::TextFormat;

use crate::error::{RcaError, Result};
use std::path::Path;

/// format tags recognized by [`load_path`], mirroring the extensions
/// each adapter claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Jsonl,
    Csv,
    Text,
    Syslog,
    Nginx,
    Apache,
    Generic,
}

impl Format {
    fn supported_extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Jsonl => &[".jsonl", ".json"],
            Format::Csv => &[".csv"],
            Format::Text | Format::Syslog | Format::Nginx | Format::Apache | Format::Generic => {
                &[".log", ".txt", ".syslog"]
            }
        }
    }

    fn text_format(&self) -> Option<TextFormat> {
        match self {
            Format::Syslog => Some(TextFormat::Syslog),
            Format::Nginx => Some(TextFormat::Nginx),
            Format::Apache => Some(TextFormat::Apache),
            Format::Generic => Some(TextFormat::Generic),
            Format::Text => None,
            _ => None,
        }
    }
}

const ALL_FORMATS: &[Format] = &[
    Format::Jsonl,
    Format::Csv,
    Format::Text,
    Format::Syslog,
    Format::Nginx,
    Format::Apache,
    Format::Generic,
];

/// picks a format by matching the path's extension against each
/// adapter's claimed list; unknown extensions fall back to the
/// auto-detecting text adapter, same as the reference factory does.
pub fn detect_format(path: impl AsRef<Path>) -> Format {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()));

    if let Some(ext) = ext {
        for format in ALL_FORMATS {
            if format.supported_extensions().contains(&ext.as_str()) {
                return *format;
            }
        }
    }
    Format::Text
}

/// loads a file through the adapter named by `format`, or the
/// extension-detected one when `format` is `None`.
pub fn load_path(
    path: impl AsRef<Path>,
    format: Option<Format>,
    lenient: bool,
) -> Result<LoadReport> {
    let format = format.unwrap_or_else(|| detect_format(&path));
    match format {
        Format::Jsonl => jsonl::load_jsonl(&path, lenient),
        Format::Csv => csv::load_csv(&path, b',', lenient),
        Format::Text | Format::Syslog | Format::Nginx | Format::Apache | Format::Generic => {
            let text = std::fs::read_to_string(&path)?;
            let events = text::parse_text(&text, format.text_format());
            if events.is_empty() && !text.trim().is_empty() && !lenient {
                return Err(RcaError::InvalidFormat(format!(
                    "no lines of {path:?} matched a known text format"
                )));
            }
            Ok(LoadReport { events, skipped: 0 })
        }
    }
}

pub fn list_supported_formats() -> Vec<(&'static str, &'static [&'static str])> {
    ALL_FORMATS
        .iter()
        .map(|f| (format_tag(*f), f.supported_extensions()))
        .collect()
}

fn format_tag(format: Format) -> &'static str {
    match format {
        Format::Jsonl => "jsonl",
        Format::Csv => "csv",
        Format::Text => "text",
        Format::Syslog => "syslog",
        Format::Nginx => "nginx",
        Format::Apache => "apache",
        Format::Generic => "generic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn detects_format_from_extension() {
        assert_eq!(detect_format("events.jsonl"), Format::Jsonl);
        assert_eq!(detect_format("events.csv"), Format::Csv);
        assert_eq!(detect_format("app.log"), Format::Text);
        assert_eq!(detect_format("app.unknownext"), Format::Text);
    }

    #[test]
    fn load_path_routes_to_jsonl_adapter() {
        let mut file = tempfile_with(".jsonl", b"{\"service\": \"api\", \"message\": \"hi\"}\n");
        let report = load_path(file.path_buf(), None, true).unwrap();
        assert_eq!(report.events.len(), 1);
        file.cleanup();
    }

    struct TempFile {
        path: std::path::PathBuf,
    }

    impl TempFile {
        fn path_buf(&self) -> std::path::PathBuf {
            self.path.clone()
        }
        fn cleanup(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile_with(suffix: &str, contents: &[u8]) -> TempFile {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "rca-ingestion-test-{}{}",
            std::process::id(),
            suffix
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents).unwrap();
        TempFile { path }
    }
}
