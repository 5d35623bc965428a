//! Error types for renewtrack.
//!
//! Library crates use [`RenewTrackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all renewtrack operations.
#[derive(Debug, thiserror::Error)]
pub enum RenewTrackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// A source document could not be opened or its text extracted.
    #[error("cannot read document {path:?}: {message}")]
    DocumentRead { path: PathBuf, message: String },

    /// Mail transport failure (connection, TLS, auth, rejected message).
    #[error("dispatch error: {0}")]
    Dispatch(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unparseable stored date, bad address, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RenewTrackError>;

impl RenewTrackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a document read error for `path`.
    pub fn document_read(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::DocumentRead {
            path: path.into(),
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = RenewTrackError::config("missing SMTP password");
        assert_eq!(err.to_string(), "config error: missing SMTP password");

        let err = RenewTrackError::document_read("contracts/a.pdf", "not a PDF");
        assert!(err.to_string().contains("a.pdf"));
        assert!(err.to_string().contains("not a PDF"));

        let err = RenewTrackError::Dispatch("connection refused".into());
        assert_eq!(err.to_string(), "dispatch error: connection refused");
    }
}
