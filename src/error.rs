//! Error types
//!
//! Only configuration and pattern problems abort a call. Everything that goes
//! wrong while organizing is recorded in the [`ResultLog`](crate::ResultLog)
//! instead.

use std::path::PathBuf;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the public operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The file picker itself failed (not a cancellation)
    #[error("file selection failed: {0}")]
    Picker(#[source] std::io::Error),

    /// The last-path store could not be read or written
    #[error("remembered config path unavailable: {message}")]
    State { message: String },
}

/// The configuration could not be turned into a usable rule list
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("rule #{index} ('{name}') is invalid: {message}")]
    InvalidRule {
        index: usize,
        name: String,
        message: String,
    },
}

/// A rule's pattern does not compile
#[derive(Debug, Clone, thiserror::Error)]
#[error("rule '{rule}' has an invalid pattern '{pattern}': {message}")]
pub struct PatternError {
    pub rule: String,
    pub pattern: String,
    pub message: String,
}
