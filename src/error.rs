//! Error handling types and utilities.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for docsearch-mcp operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when loading a search index payload fails.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    /// Payload file not found at the expected path.
    #[error("Search index not found at {}", path.display())]
    NotFound { path: PathBuf },
    /// The file exists but could not be read.
    #[error("Failed to read search index at {}: {error}", path.display())]
    Io { path: PathBuf, error: String },
    /// The payload is not valid JSON (after stripping the `var` assignment).
    #[error("Failed to parse search index: {0}")]
    Parse(String),
    /// The payload parsed but has no `docs` array at the top level.
    #[error("Search index has no top-level `docs` array")]
    MissingDocs,
    /// No source is registered under the requested name.
    #[error("No search index named '{name}' is registered")]
    UnknownIndex { name: String },
    /// A default index was requested but no source is registered.
    #[error("No search index configured. Use load_index or pass --index NAME=PATH.")]
    NoIndexConfigured,
    /// The background load task failed before producing a result.
    #[error("Loading search index '{name}' failed: {error}")]
    Task { name: String, error: String },
}

/// Error returned when the configuration file or CLI arguments are invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid index source '{0}', expected NAME=PATH or PATH")]
    InvalidSource(String),
    #[error("Index name '{0}' is configured more than once")]
    DuplicateName(String),
}
