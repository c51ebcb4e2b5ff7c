//! Runtime configuration: TOML config file merged with command-line sources.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of loaded indexes kept in memory.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Default interval between source modification checks.
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 5;

/// A named search index source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexSource {
    pub name: String,
    pub path: PathBuf,
}

impl IndexSource {
    /// Parse a `NAME=PATH` or bare `PATH` argument.
    ///
    /// A bare path is named after the directory that contains the file, which for a
    /// Documenter build is the site root (`build/search_index.js` → `build`).
    pub fn parse(arg: &str) -> std::result::Result<Self, ConfigError> {
        let (name, path) = match arg.split_once('=') {
            Some((name, path)) => (name.trim().to_string(), path.trim()),
            None => (String::new(), arg.trim()),
        };

        if path.is_empty() {
            return Err(ConfigError::InvalidSource(arg.to_string()));
        }

        let path = PathBuf::from(&*expand_tilde(path));
        let name = if name.is_empty() {
            default_source_name(&path)
        } else {
            name
        };

        Ok(Self { name, path })
    }
}

/// Derive a source name from a payload path.
pub fn default_source_name(path: &Path) -> String {
    let stem = if path.is_dir() {
        path.file_name()
    } else {
        path.parent().and_then(Path::file_name)
    };

    stem.map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "default".to_string())
}

/// On-disk configuration file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    cache_dir: Option<PathBuf>,
    cache_capacity: Option<usize>,
    reload_interval_secs: Option<u64>,
    #[serde(rename = "index")]
    indexes: Vec<IndexSource>,
}

/// Resolved configuration for a server or CLI run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for persisted term indexes. `None` disables the on-disk cache.
    pub cache_dir: Option<PathBuf>,
    /// Number of loaded indexes kept in the LRU cache.
    pub cache_capacity: usize,
    /// Interval between reload checks; zero disables the reload worker.
    pub reload_interval: Duration,
    /// Configured sources in declaration order. The first is the default.
    pub sources: Vec<IndexSource>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir().map(|dir| dir.join("docsearch-mcp")),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            reload_interval: Duration::from_secs(DEFAULT_RELOAD_INTERVAL_SECS),
            sources: Vec::new(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str, path: &Path) -> std::result::Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let defaults = Self::default();
        let mut config = Self {
            cache_dir: file
                .cache_dir
                .map(|dir| PathBuf::from(&*expand_tilde(&dir.to_string_lossy())))
                .or(defaults.cache_dir),
            cache_capacity: file.cache_capacity.unwrap_or(defaults.cache_capacity).max(1),
            reload_interval: file
                .reload_interval_secs
                .map_or(defaults.reload_interval, Duration::from_secs),
            sources: Vec::new(),
        };

        for source in file.indexes {
            let path = PathBuf::from(&*expand_tilde(&source.path.to_string_lossy()));
            config.add_source(IndexSource {
                name: source.name,
                path,
            })?;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Build the run configuration from an optional file plus CLI sources.
    ///
    /// Sources given on the command line replace file sources of the same name.
    pub fn resolve(config_path: Option<&Path>, cli_sources: &[String]) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        for arg in cli_sources {
            let source = IndexSource::parse(arg)?;
            config.sources.retain(|s| s.name != source.name);
            config.sources.push(source);
        }

        tracing::debug!(
            "Resolved config: {} sources, cache {:?}, reload every {:?}",
            config.sources.len(),
            config.cache_dir,
            config.reload_interval
        );

        Ok(config)
    }

    fn add_source(&mut self, source: IndexSource) -> std::result::Result<(), ConfigError> {
        if self.sources.iter().any(|s| s.name == source.name) {
            return Err(ConfigError::DuplicateName(source.name));
        }
        self.sources.push(source);
        Ok(())
    }
}

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}
