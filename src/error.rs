//! Error types for dock-collector
//!
//! This module provides the error taxonomy for the library:
//! - [`ValidationError`] - rejected `start()` requests (the run never begins)
//! - [`FetchError`] - per-tenant failures, isolated by the pipeline
//! - [`PersistenceError`] - failures writing the aggregated output file
//! - [`Error`] - the top-level error returned by fallible public operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dock-collector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dock-collector
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.url_template")
        key: Option<String>,
    },

    /// The start request was rejected before any work began
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// A collection run is already in progress on this collector
    #[error("operation already in progress")]
    AlreadyRunning,

    /// Fetching docks for a single tenant failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Writing the output file failed
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside of a per-tenant fetch (e.g., building the HTTP client)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The background run task ended without producing a report
    #[error("collection task failed: {0}")]
    TaskFailed(String),
}

/// Reasons a start request is rejected synchronously
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// App key and app token must both be non-empty
    #[error("App Key and App Token are required")]
    MissingCredentials,

    /// Credentials contain bytes that cannot be sent in an HTTP header
    #[error("App Key and App Token must be valid HTTP header values")]
    InvalidCredentials,

    /// At least one tenant is required
    #[error("tenant list cannot be empty")]
    EmptyTenantList,

    /// A tenant identifier is empty or whitespace
    #[error("tenant at position {index} is blank")]
    BlankTenant {
        /// Zero-based position of the blank entry in the request
        index: usize,
    },
}

/// Classification of a per-tenant fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request did not complete within the configured timeout
    Timeout,
    /// The connection could not be established
    Connect,
    /// The API answered with a non-success status code
    Status(u16),
    /// The response body was not a JSON array of dock objects
    Decode,
    /// Any other request failure (invalid URL, TLS, redirect loop...)
    Request,
    /// The tenant name cannot be used as a host label; no request was sent
    InvalidTenant,
}

/// A single tenant's fetch failed
///
/// The pipeline always catches this error, records it as an `ERROR` log event
/// and moves on to the next tenant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    /// Tenant whose request failed
    pub tenant_id: String,
    /// What kind of failure occurred
    pub kind: FetchErrorKind,
    /// Human-readable description, used verbatim as the log event details
    pub message: String,
}

impl FetchError {
    /// Create a new fetch error
    pub fn new(tenant_id: impl Into<String>, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            kind,
            message: message.into(),
        }
    }

    /// Whether the failure was a request timeout
    pub fn is_timeout(&self) -> bool {
        self.kind == FetchErrorKind::Timeout
    }
}

/// Failures while writing the aggregated record set
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem error (directory creation, file write, rename)
    #[error("failed to write {path}: {source}")]
    Io {
        /// Path being written when the error occurred
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Spreadsheet serialization failed
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// The output path cannot be used (no file name, etc.)
    #[error("invalid output path {path}: {reason}")]
    InvalidPath {
        /// The offending path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// The blocking writer task panicked or was cancelled
    #[error("writer task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create a configuration error for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Short machine-readable code for the error, suitable for exit reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::AlreadyRunning => "already_running",
            Error::Fetch(_) => "fetch_error",
            Error::Persistence(_) => "persistence_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::TaskFailed(_) => "task_failed",
        }
    }
}
