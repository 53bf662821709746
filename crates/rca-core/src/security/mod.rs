pub mod redact;
pub mod regex_safety;

pub use redact::{sanitize_api_error, sanitize_filename_for_display, sanitize_for_llm, sanitize_for_logging};
pub use regex_safety::validate_regex_safety;
