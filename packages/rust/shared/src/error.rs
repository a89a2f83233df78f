//! Error types for jobharvest.
//!
//! Library crates use [`JobharvestError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all jobharvest operations.
#[derive(Debug, thiserror::Error)]
pub enum JobharvestError {
    /// Configuration loading or validation error. Fatal before any work starts.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during fetching.
    #[error("network error: {0}")]
    Network(String),

    /// The upstream answered 429 Too Many Requests. Aborts the whole run.
    #[error("rate limited by upstream{}", retry_after.map(|s| format!(" (retry after {s}s)")).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    /// HTML parsing or record extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Blob persistence error.
    #[error("blob error: {0}")]
    Blob(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, JobharvestError>;

impl JobharvestError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the whole run rather than one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Config { .. })
    }
}
