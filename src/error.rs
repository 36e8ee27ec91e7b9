// src/error.rs

//! Crate-wide error type

use thiserror::Error;

/// Errors produced by discovery, relocation and version resolution
#[derive(Debug, Error)]
pub enum Error {
    /// The version expression is not a valid semantic-version range
    #[error("Invalid version range: {0}")]
    VersionRangeError(String),

    /// No candidate satisfied the request
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// A candidate source could not be reached or listed
    #[error("Source unavailable: {0}")]
    SourceError(String),

    /// A document could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    IoError(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The image scanner reported a failure
    #[error("Scan error: {0}")]
    ScanError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

/// Result type for helmport operations
pub type Result<T> = std::result::Result<T, Error>;
