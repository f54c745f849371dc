//! Error types for the editorial pipeline.
//!
//! Library crates use [`EditorialError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` and turns anything that escapes a
//! stage into a failure report.

use std::path::PathBuf;

/// Top-level error type for all editorial pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorialError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Frontmatter, style guide, or other text parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON (de)serialization error for a metadata or sidecar file.
    #[error("JSON error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Data validation error (missing id, wrong shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Asset copy or read error.
    #[error("asset error: {0}")]
    Asset(String),

    /// Markdown-to-HTML rendering error.
    #[error("render error: {0}")]
    Render(String),

    /// A background worker panicked or was cancelled.
    #[error("task error: {message}")]
    Task { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EditorialError>;

impl EditorialError {
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

    /// Create a task error from any displayable message.
    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task {
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

    /// Wrap a `serde_json::Error` with the file it came from.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
