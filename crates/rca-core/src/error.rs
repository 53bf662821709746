//! error taxonomy for the engine. variants are grouped by the semantics
//! the caller needs to act on (retryable vs fatal vs accumulate-and-continue),
//! not by which module raised them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RcaError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("path validation failed: {0}")]
    PathValidation(String),

    #[error("file too large: {path} is {size} bytes, max is {max} bytes")]
    FileTooLarge { path: String, size: u64, max: u64 },

    #[error("unsupported or malformed input: {0}")]
    InvalidFormat(String),

    #[error("failed to parse record: {0}")]
    Parse(String),

    #[error("refusing unsafe regex pattern: {0}")]
    UnsafeRegex(String),

    #[error("event failed validation: {0}")]
    Validation(String),

    #[error("graph build error: {0}")]
    GraphBuild(String),

    #[error("node not found in graph: {0}")]
    NodeNotFound(String),

    #[error("circuit is open, request rejected without consuming a retry")]
    CircuitOpen,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, RcaError>;
