//! Error types for physics configuration

use std::path::PathBuf;
use thiserror::Error;

/// Result type for physics setup
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading or validating physics settings
///
/// Stepping itself never fails; these only surface before a run starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for this schema
    #[error("failed to parse physics config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of its accepted range
    #[error("invalid physics config: {0}")]
    Invalid(String),
}
