// src/error.rs

//! Unified error handling for the acquisition pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// No site descriptor registered under the requested name
    #[error("No site available for: {0}")]
    UnknownSite(String),

    /// No configured fetcher accepts the URL
    #[error("No fetcher available for url: {0}")]
    NoFetcher(String),

    /// No configured parser accepts the URL
    #[error("No parser available for url: {0}")]
    NoParser(String),

    /// No configured store accepts the URL
    #[error("No store available for url: {0}")]
    NoStore(String),

    /// URL could not be parsed or carries no host
    #[error("Could not detect host in url: {0}")]
    InvalidUrl(String),

    /// Transport failure or non-success HTTP status
    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Embedded data block missing or malformed
    #[error("Parse error for marker '{marker}': {message}")]
    Parse { marker: String, message: String },

    /// Malformed projection, path or statement
    #[error("Query error: {0}")]
    Query(String),

    /// Storage engine could not be reached or failed below the statement level
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a URL.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error naming the marker that failed.
    pub fn parse(marker: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            marker: marker.into(),
            message: message.to_string(),
        }
    }

    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// SQLite primary result codes raised by the engine rather than the statement:
/// BUSY, LOCKED, READONLY, IOERR, CORRUPT, FULL, CANTOPEN, NOTADB.
const ENGINE_FAILURE_CODES: [i32; 8] = [5, 6, 8, 10, 11, 13, 14, 26];

/// Whether a database error code reports an engine failure. Extended codes
/// carry the primary code in their low byte.
fn is_engine_failure(code: &str) -> bool {
    code.parse::<i32>()
        .map(|code| ENGINE_FAILURE_CODES.contains(&(code & 0xff)))
        .unwrap_or(false)
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Database(db) => {
                if db.code().is_some_and(|code| is_engine_failure(&code)) {
                    Self::StorageUnavailable(db.to_string())
                } else {
                    Self::Query(db.to_string())
                }
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Query(error.to_string())
            }
            other => Self::StorageUnavailable(other.to_string()),
        }
    }
}
