//! Shared test fixtures and utilities for integration tests.
//!
//! # Test Isolation Strategy
//!
//! Each test gets its own temp directory holding a copy of the fixture
//! `search_index.js` and an empty term-index cache directory, plus a fresh
//! `IndexState` with an empty LRU cache. Tests can rewrite the copied payload
//! without affecting each other.

use docsearch_mcp::{Config, IndexSource, IndexState};
use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Name the fixture index is registered under.
#[allow(dead_code)]
pub const FIXTURE_NAME: &str = "hydro";

/// Returns the project root directory (where Cargo.toml lives).
pub fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Path to the checked-in fixture payload.
pub fn fixture_path() -> PathBuf {
    project_root().join("tests/fixtures/search_index.js")
}

/// Raw fixture payload text.
#[allow(dead_code)]
pub fn fixture_source() -> String {
    std::fs::read_to_string(fixture_path()).expect("Failed to read fixture payload")
}

/// An isolated documentation site with its own index state.
#[allow(dead_code)] // Fields used across different integration test crates
pub struct IsolatedSite {
    _temp: TempDir,
    root: PathBuf,
    pub payload_path: PathBuf,
    pub cache_dir: PathBuf,
    pub state: Arc<IndexState>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl IsolatedSite {
    /// Copies the fixture into `<tmp>/hydro/build/search_index.js` and registers it.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        // Canonical so paths match what discovery reports
        let root = temp
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory");

        let build_dir = root.join("hydro/build");
        std::fs::create_dir_all(&build_dir).expect("Failed to create build directory");
        let payload_path = build_dir.join("search_index.js");
        std::fs::copy(fixture_path(), &payload_path).expect("Failed to copy fixture");

        let cache_dir = root.join("cache");

        let config = Config {
            cache_dir: Some(cache_dir.clone()),
            cache_capacity: 4,
            reload_interval: Duration::ZERO,
            sources: vec![IndexSource {
                name: FIXTURE_NAME.to_string(),
                path: payload_path.clone(),
            }],
        };

        Self {
            _temp: temp,
            root,
            payload_path,
            cache_dir,
            state: Arc::new(IndexState::new(&config)),
        }
    }

    /// Returns the root path of this site.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a file relative to the site root, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", relative, e)
            });
        }
        std::fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", relative, e));
        path
    }

    /// Number of persisted term indexes in the cache directory.
    pub fn cached_index_files(&self) -> usize {
        std::fs::read_dir(&self.cache_dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|e| e.path().extension().is_some_and(|ext| ext == "index"))
                    .count()
            })
            .unwrap_or(0)
    }
}

impl Default for IsolatedSite {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an isolated site for testing.
///
/// Returns `IsolatedSite` rather than just the state because the temp
/// directory must stay alive for the duration of the test.
#[fixture]
pub fn isolated_site() -> IsolatedSite {
    IsolatedSite::new()
}
