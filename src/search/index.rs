//! TF-IDF inverted index implementation for full-text search.

use crate::index::SearchIndex;
use postcard::{from_io, to_io};
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, path::PathBuf};

use super::tokenize::{TermBuilder, hash_term, tokenize_and_stem};

/// Term hash for fast lookup
type TermHash = u64;

/// Bumped whenever tokenization or scoring changes so stale caches are ignored.
const CACHE_FORMAT_VERSION: u32 = 1;

/// A searchable term index with TF-IDF scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    /// Map from term hash to list of (entry position, tf_idf_score) pairs, sorted by score descending
    terms: HashMap<TermHash, Vec<(u32, f32)>>,
    /// Number of entries the index was built from
    documents: usize,
}

impl InvertedIndex {
    pub(super) fn new(terms: HashMap<TermHash, Vec<(u32, f32)>>, documents: usize) -> Self {
        Self { terms, documents }
    }

    /// Builds an index over every entry of a payload.
    pub fn build(payload: &SearchIndex) -> Self {
        let mut builder = TermBuilder::default();
        for (position, entry) in payload.entries().iter().enumerate() {
            // Payloads are far below u32::MAX entries; positions past it are not indexed.
            let Ok(doc_id) = u32::try_from(position) else {
                tracing::warn!("Search index too large, truncating at {} entries", position);
                break;
            };
            builder.add_entry(doc_id, entry);
        }
        builder.finalize()
    }

    /// Searches for entries matching the query using TF-IDF scoring.
    /// Returns entry positions sorted by relevance score (highest first).
    ///
    /// The query is tokenized and stemmed just like indexed terms, so:
    /// - "ReservoirBudget" matches entries with "reservoir", "budget", or "reservoirbudget"
    /// - CamelCase, snake_case, and hyphen-case are all handled
    pub fn search(&self, query: &str, limit: usize) -> Vec<(usize, f32)> {
        let stemmer = Stemmer::create(Algorithm::English);
        let tokens = tokenize_and_stem(query, &stemmer);

        if tokens.is_empty() {
            return vec![];
        }

        // Combine scores for documents that match multiple tokens
        let mut combined_scores: HashMap<u32, f32> = HashMap::new();

        for token in &tokens {
            let term_hash = hash_term(token);
            if let Some(results) = self.terms.get(&term_hash) {
                for (doc_idx, score) in results {
                    *combined_scores.entry(*doc_idx).or_insert(0.0) += score;
                }
            }
        }

        let mut results: Vec<_> = combined_scores.into_iter().collect();
        results.sort_by(|(a_id, a), (b_id, b)| b.total_cmp(a).then(a_id.cmp(b_id)));

        results
            .into_iter()
            .take(limit)
            .map(|(doc_idx, score)| (doc_idx as usize, score))
            .collect()
    }

    /// Get the number of unique terms in the index
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Get the number of documents in the index
    pub fn document_count(&self) -> usize {
        self.documents
    }
}

/// On-disk envelope for a cached index.
#[derive(Serialize, Deserialize)]
struct CachedIndex {
    version: u32,
    fingerprint: u64,
    index: InvertedIndex,
}

/// Persists term indexes keyed by source name and payload fingerprint.
///
/// Files are named `<source>-<fingerprint>.index`. Once a new build of a
/// source is stored, that source's files for older fingerprints are removed,
/// so the directory holds at most one file per source.
#[derive(Debug, Clone)]
pub struct IndexCache {
    dir: PathBuf,
}

impl IndexCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file path for a source at a given fingerprint.
    pub fn path_for(&self, source: &str, fingerprint: u64) -> PathBuf {
        self.dir
            .join(format!("{}-{:016x}.index", cache_key(source), fingerprint))
    }

    /// Loads the cached index for `payload`, or builds and stores a new one.
    pub fn load_or_build(&self, source: &str, payload: &SearchIndex) -> InvertedIndex {
        let fingerprint = payload.fingerprint();
        let path = self.path_for(source, fingerprint);

        if let Some(index) = Self::load(&path, fingerprint) {
            tracing::debug!(
                "Loaded cached search index {} ({} terms, {} docs)",
                path.display(),
                index.term_count(),
                index.document_count()
            );
            return index;
        }

        let start = std::time::Instant::now();
        let index = InvertedIndex::build(payload);
        tracing::debug!("Index build completed in {:?}", start.elapsed());

        if self.store(&index, fingerprint, &path) {
            self.prune(source, &path);
        }
        index
    }

    /// Remove every file cached for `source` except `keep`.
    fn prune(&self, source: &str, keep: &Path) {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        let key = cache_key(source);

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path == keep {
                continue;
            }
            let Some(stem) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".index"))
            else {
                continue;
            };
            // Fingerprints are hex, so the last '-' separates the source key
            if stem.rsplit_once('-').is_some_and(|(owner, _)| owner == key) {
                match std::fs::remove_file(&path) {
                    Ok(()) => tracing::debug!("Removed outdated index {}", path.display()),
                    Err(e) => tracing::warn!(
                        "Failed to remove outdated index {}: {}",
                        path.display(),
                        e
                    ),
                }
            }
        }
    }

    /// Load a cached index from disk.
    fn load(path: &Path, fingerprint: u64) -> Option<InvertedIndex> {
        let mut file = std::fs::File::open(path).ok()?;
        let mut buf = [0u8; 8192];
        match from_io::<CachedIndex, _>((&mut file, &mut buf)) {
            Ok((cached, _))
                if cached.version == CACHE_FORMAT_VERSION && cached.fingerprint == fingerprint =>
            {
                Some(cached.index)
            }
            Ok(_) => {
                tracing::info!("Cached index at {} is stale, rebuilding", path.display());
                let _ = std::fs::remove_file(path);
                None
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to deserialize cached index at {}: {}",
                    path.display(),
                    e
                );
                let _ = std::fs::remove_file(path);
                None
            }
        }
    }

    /// Store an index to disk. Returns whether the file is now in place.
    fn store(&self, index: &InvertedIndex, fingerprint: u64, path: &Path) -> bool {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(
                "Failed to create cache directory {}: {}",
                self.dir.display(),
                e
            );
            return false;
        }

        let cached = CachedIndex {
            version: CACHE_FORMAT_VERSION,
            fingerprint,
            index: index.clone(),
        };

        match std::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(path)
        {
            Ok(mut file) => {
                if let Err(e) = to_io(&cached, &mut file) {
                    tracing::warn!("Failed to write search index to {}: {}", path.display(), e);
                    let _ = std::fs::remove_file(path);
                    false
                } else {
                    tracing::debug!("Cached search index to {}", path.display());
                    true
                }
            }
            Err(e) if e.kind() != std::io::ErrorKind::AlreadyExists => {
                tracing::warn!("Failed to create index file {}: {}", path.display(), e);
                false
            }
            _ => {
                // Another process may have created it
                tracing::debug!("Index file already exists at {}", path.display());
                true
            }
        }
    }
}

/// File-name-safe form of a source name.
fn cache_key(source: &str) -> String {
    source
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
