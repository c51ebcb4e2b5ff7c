//! Shared index state and the background reload worker.
//!
//! Loaded indexes are cached in an LRU keyed by source name. Concurrent
//! requests for the same source share one in-flight load. The reload worker
//! watches source files and swaps in a freshly built index whenever a new
//! documentation build replaces one.

use crate::config::{Config, IndexSource};
use crate::error::LoadError;
use crate::index::SearchIndex;
use crate::search::{IndexCache, InvertedIndex, Lookup, SearchHit, SearchQuery};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Duration, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Type alias for shared index load futures.
type SharedLoadFuture = Shared<BoxFuture<'static, Result<Arc<LoadedIndex>, LoadError>>>;

/// A parsed payload together with its term index.
#[derive(Debug)]
pub struct LoadedIndex {
    pub name: String,
    pub path: PathBuf,
    pub payload: SearchIndex,
    pub terms: InvertedIndex,
    /// Modification time of the source when it was read
    pub modified: Option<SystemTime>,
}

impl LoadedIndex {
    /// Read a source and build (or fetch from cache) its term index.
    pub fn load(source: &IndexSource, cache: Option<&IndexCache>) -> Result<Self, LoadError> {
        let modified = std::fs::metadata(&source.path)
            .ok()
            .and_then(|m| m.modified().ok());
        let payload = SearchIndex::load(&source.path)?;
        let terms = match cache {
            Some(cache) => cache.load_or_build(&source.name, &payload),
            None => InvertedIndex::build(&payload),
        };

        Ok(Self {
            name: source.name.clone(),
            path: source.path.clone(),
            payload,
            terms,
            modified,
        })
    }

    pub fn search(&self, query: &SearchQuery<'_>) -> Vec<SearchHit<'_>> {
        crate::search::execute(&self.payload, &self.terms, query)
    }

    pub fn lookup(&self, target: &str) -> Lookup<'_> {
        crate::search::lookup(&self.payload, target)
    }
}

/// Shared state for registered sources and loaded indexes.
///
/// This is the central coordination point for:
/// - Named sources (first registered is the default)
/// - Caching loaded indexes (LRU)
/// - Tracking in-flight loads (shared futures)
pub struct IndexState {
    /// Registered sources in registration order
    sources: RwLock<Vec<IndexSource>>,

    /// LRU cache of loaded indexes
    cache: RwLock<LruCache<String, Arc<LoadedIndex>>>,

    /// In-flight load futures (can be awaited by multiple callers)
    in_flight: Mutex<HashMap<String, SharedLoadFuture>>,

    /// On-disk term index cache, if enabled
    index_cache: Option<IndexCache>,
}

impl std::fmt::Debug for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexState")
            .field("sources", &self.sources.try_read().map(|s| s.len()).ok())
            .field("cache_size", &self.cache.try_read().map(|c| c.len()).ok())
            .field("index_cache", &self.index_cache)
            .finish()
    }
}

impl IndexState {
    pub fn new(config: &Config) -> Self {
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sources: RwLock::new(config.sources.clone()),
            cache: RwLock::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            index_cache: config.cache_dir.clone().map(IndexCache::new),
        }
    }

    /// All registered sources in registration order.
    pub async fn sources(&self) -> Vec<IndexSource> {
        self.sources.read().await.clone()
    }

    /// Look up a registered source by name.
    pub async fn source(&self, name: &str) -> Option<IndexSource> {
        self.sources
            .read()
            .await
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    /// Resolve an optional name to a registered source, defaulting to the first.
    pub async fn resolve(&self, name: Option<&str>) -> Result<IndexSource, LoadError> {
        let sources = self.sources.read().await;
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => sources
                .iter()
                .find(|s| s.name == name)
                .cloned()
                .ok_or_else(|| LoadError::UnknownIndex {
                    name: name.to_string(),
                }),
            None => sources.first().cloned().ok_or(LoadError::NoIndexConfigured),
        }
    }

    /// Register a source. Returns `true` if anything changed.
    ///
    /// Re-registering a name with a different path drops its cached index.
    pub async fn register(&self, source: IndexSource) -> bool {
        let mut sources = self.sources.write().await;

        if let Some(existing) = sources.iter_mut().find(|s| s.name == source.name) {
            if existing.path == source.path {
                return false;
            }
            tracing::info!(
                "Index '{}' moved from {} to {}",
                source.name,
                existing.path.display(),
                source.path.display()
            );
            existing.path = source.path;
            drop(sources);
            self.evict(&source.name).await;
            return true;
        }

        tracing::info!(
            "Registered index '{}' at {}",
            source.name,
            source.path.display()
        );
        sources.push(source);
        true
    }

    /// Drop a cached index and any in-flight load for it.
    pub async fn evict(&self, name: &str) {
        self.cache.write().await.pop(name);
        self.in_flight.lock().await.remove(name);
    }

    /// Get a loaded index, waiting for an in-flight load if needed.
    ///
    /// This is the main entry point for tool handlers. It:
    /// 1. Resolves the source name (default: first registered)
    /// 2. Checks the LRU cache
    /// 3. Checks for an in-flight load (awaits if found)
    /// 4. Starts a new load if needed
    pub async fn get(&self, name: Option<&str>) -> Result<Arc<LoadedIndex>, LoadError> {
        let source = self.resolve(name).await?;

        {
            let mut cache = self.cache.write().await;
            if let Some(index) = cache.get(&source.name) {
                tracing::debug!("Cache hit for {}", source.name);
                return Ok(index.clone());
            }
        }

        let maybe_future = {
            let in_flight = self.in_flight.lock().await;
            in_flight.get(&source.name).cloned()
        };

        if let Some(future) = maybe_future {
            tracing::debug!("Awaiting in-flight load for {}", source.name);
            return future.await;
        }

        self.load(source).await
    }

    /// Start loading a source through a shared future.
    async fn load(&self, source: IndexSource) -> Result<Arc<LoadedIndex>, LoadError> {
        let name = source.name.clone();

        let shared_future = {
            let mut in_flight = self.in_flight.lock().await;
            // Another caller may have started the load while we checked the cache
            if let Some(future) = in_flight.get(&name) {
                future.clone()
            } else {
                let future = Self::load_future(source, self.index_cache.clone());
                in_flight.insert(name.clone(), future.clone());
                tracing::info!("Loading search index '{}'", name);
                future
            }
        };

        let result = shared_future.clone().await;

        self.finish_in_flight(&name, &shared_future).await;

        if let Ok(ref index) = result {
            // Skip caching if the source was re-registered while loading
            if self
                .source(&name)
                .await
                .is_some_and(|s| s.path == index.path)
            {
                self.cache.write().await.put(name.clone(), index.clone());
                tracing::debug!("Cached index {}", name);
            }
        }

        result
    }

    /// Clear the in-flight entry for `name` if it still belongs to `future`.
    ///
    /// A re-registered source may already have a newer load under the same name.
    async fn finish_in_flight(&self, name: &str, future: &SharedLoadFuture) {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.get(name).is_some_and(|f| f.ptr_eq(future)) {
            in_flight.remove(name);
        }
    }

    fn load_future(source: IndexSource, index_cache: Option<IndexCache>) -> SharedLoadFuture {
        let future: BoxFuture<'static, Result<Arc<LoadedIndex>, LoadError>> =
            Box::pin(async move {
                let name = source.name.clone();
                // Parsing and indexing are CPU bound
                tokio::task::spawn_blocking(move || {
                    LoadedIndex::load(&source, index_cache.as_ref()).map(Arc::new)
                })
                .await
                .map_err(|e| LoadError::Task {
                    name,
                    error: e.to_string(),
                })?
            });
        future.shared()
    }

    /// Reload a cached index if its source changed on disk.
    ///
    /// Returns `Ok(true)` when a new index was swapped in. On failure the
    /// previous index stays in place.
    pub async fn reload_if_modified(&self, name: &str) -> Result<bool, LoadError> {
        let Some(current) = self.cache.read().await.peek(name).cloned() else {
            return Ok(false);
        };

        let modified = source_modified(&current.path).await;
        let changed = match (modified, current.modified) {
            (Some(now), Some(before)) => now > before,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !changed {
            return Ok(false);
        }

        tracing::info!(
            "Search index '{}' changed on disk, reloading {}",
            name,
            current.path.display()
        );

        let source = IndexSource {
            name: current.name.clone(),
            path: current.path.clone(),
        };
        let fresh = Self::load_future(source, self.index_cache.clone()).await?;

        // The source may have been re-registered elsewhere while loading
        if self
            .source(name)
            .await
            .is_some_and(|s| s.path == fresh.path)
        {
            self.cache.write().await.put(name.to_string(), fresh);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Names of currently cached indexes.
    pub async fn cached_names(&self) -> Vec<String> {
        self.cache
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Check if an index is cached.
    pub async fn is_cached(&self, name: &str) -> bool {
        self.cache.read().await.contains(name)
    }

    /// Check if a load is in progress.
    pub async fn is_loading(&self, name: &str) -> bool {
        self.in_flight.lock().await.contains_key(name)
    }
}

async fn source_modified(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Background worker that swaps in rebuilt indexes when sources change.
pub struct ReloadWorker {
    state: Arc<IndexState>,
    interval: Duration,
}

impl ReloadWorker {
    pub fn new(state: Arc<IndexState>, interval: Duration) -> Self {
        Self { state, interval }
    }

    /// Run until cancelled, checking cached sources every interval.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; indexes were just loaded
        ticker.tick().await;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("Reload worker stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.check_sources().await;
                }
            }
        }
    }

    /// Perform one reload cycle. Returns the number of indexes swapped.
    pub async fn check_sources(&self) -> usize {
        let mut reloaded = 0;

        for name in self.state.cached_names().await {
            match self.state.reload_if_modified(&name).await {
                Ok(true) => reloaded += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Reload of '{}' failed, keeping previous index: {}", name, e);
                }
            }
            tokio::task::yield_now().await;
        }

        if reloaded > 0 {
            tracing::info!("Reloaded {} search indexes", reloaded);
        }
        reloaded
    }
}

/// Spawn the reload worker as a tokio task.
///
/// Returns `None` when the interval is zero (reloading disabled).
pub fn spawn_reload_worker(
    state: Arc<IndexState>,
    interval: Duration,
    cancel: CancellationToken,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval.is_zero() {
        tracing::debug!("Reload worker disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        ReloadWorker::new(state, interval).run(cancel).await;
    }))
}
