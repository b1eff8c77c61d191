//! Error types for bmad-convert.
//!
//! Library crates use [`ConverterError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all conversion operations.
#[derive(Debug, thiserror::Error)]
pub enum ConverterError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A manifest row points at a source file that does not exist.
    #[error("source file not found for {kind} '{name}' at {path:?}")]
    MissingSource {
        kind: &'static str,
        name: String,
        path: PathBuf,
    },

    /// Source text could not be decoded (YAML, UTF-8, CSV structure).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// No manifest table was found at the expected location.
    #[error("No manifest files found in {}", config_dir.display())]
    MissingManifests { config_dir: PathBuf },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Output serialization error (run manifest, config file).
    #[error("write error: {0}")]
    Write(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ConverterError>;

impl ConverterError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// A manifest row whose source file is absent.
    pub fn missing_source(
        kind: &'static str,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self::MissingSource {
            kind,
            name: name.into(),
            path: path.into(),
        }
    }

    /// Whether this failure should be reported as a warning rather than an error.
    ///
    /// Missing source files are routine in partially installed module trees.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MissingSource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ConverterError::config("unknown target");
        assert_eq!(err.to_string(), "config error: unknown target");

        let err = ConverterError::MissingManifests {
            config_dir: PathBuf::from("/tmp/_bmad/_config"),
        };
        assert_eq!(err.to_string(), "No manifest files found in /tmp/_bmad/_config");
    }

    #[test]
    fn missing_source_is_a_warning() {
        let err = ConverterError::missing_source("agent", "pm", "/tmp/pm.md");
        assert!(err.is_warning());
        assert!(err.to_string().contains("agent 'pm'"));
        assert!(!ConverterError::parse("bad yaml").is_warning());
    }
}
