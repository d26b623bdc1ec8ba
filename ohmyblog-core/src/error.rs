//! Structured error types for ohmyblog-core.
//!
//! Library consumers get `thiserror` enums; the binary wraps them in
//! `anyhow` with context.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating [`crate::config::Settings`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Config file is not valid TOML or does not match the schema
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Environment override could not be applied
    #[error("invalid environment override {key}: {reason}")]
    Override { key: String, reason: String },

    /// A field holds a value the service cannot run with
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    /// Create an environment override error
    pub fn override_error(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Override {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
