//! Error types for quizpack-harvest
//!
//! One error enum covers the whole run. Whether a given error is fatal depends on
//! where it surfaces:
//! - key discovery wraps request failures in [`Error::Enumeration`], which aborts the run
//! - batch fetch and option lookup failures are isolated per task and only logged
//! - configuration and output errors abort the run

use thiserror::Error;

/// Result type alias for quizpack-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for quizpack-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch_concurrency")
        key: Option<String>,
    },

    /// Key discovery for a category filter failed; the whole run is aborted
    #[error("key discovery failed for category '{filter}': {source}")]
    Enumeration {
        /// The category filter whose discovery request failed
        filter: String,
        /// The underlying request or payload error
        #[source]
        source: Box<Error>,
    },

    /// Network error (connect failure, per-call deadline elapsed, body read failure)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote API answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Request URL
        url: String,
    },

    /// Response body was not valid JSON for the expected shape
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response body parsed but did not have the expected structure
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Wrap a request failure as a fatal key discovery failure for `filter`
    pub fn enumeration(filter: impl Into<String>, source: Error) -> Self {
        Error::Enumeration {
            filter: filter.into(),
            source: Box::new(source),
        }
    }

    /// Whether the error is a per-call deadline expiry
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout(),
            Error::Enumeration { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Machine-readable error code, used in structured log fields and events
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config",
            Error::Enumeration { .. } => "enumeration",
            Error::Network(e) if e.is_timeout() => "timeout",
            Error::Network(_) => "network",
            Error::HttpStatus { .. } => "http_status",
            Error::Serialization(_) => "serialization",
            Error::InvalidPayload(_) => "invalid_payload",
            Error::Io(_) => "io",
            Error::Csv(_) => "csv",
            Error::Other(_) => "other",
        }
    }
}
