//! Error types for asrskit.
//!
//! Library crates use [`AsrsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all asrskit operations.
#[derive(Debug, thiserror::Error)]
pub enum AsrsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input bytes are not valid UTF-8.
    #[error("cannot decode {path:?} as UTF-8: {source}")]
    Decode {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },

    /// JSON (de)serialization error for record files.
    #[error("JSON error at {path:?}: {message}")]
    Json { path: PathBuf, message: String },

    /// Transport-level failure talking to the classification service.
    #[error("network error: {0}")]
    Network(String),

    /// The classification service answered with a non-success status.
    #[error("API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// Data validation error (bad range, unexpected shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AsrsError>;

impl AsrsError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a JSON error with the file it came from.
    pub fn json(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Json {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = AsrsError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = AsrsError::validation("start index 12 out of bounds");
        assert!(err.to_string().contains("start index 12"));

        let err = AsrsError::Api {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "API error (HTTP 429): rate limited");
    }

    #[test]
    fn decode_error_names_path() {
        let source = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err = AsrsError::Decode {
            path: "export.html".into(),
            source,
        };
        assert!(err.to_string().contains("export.html"));
    }
}
