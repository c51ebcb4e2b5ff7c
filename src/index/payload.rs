//! Loading and regenerating `search_index.js` payloads.
//!
//! The generator writes a single JavaScript assignment:
//!
//! ```text
//! var documenterSearchIndex = {"docs":
//! [{"location":"...","page":"...","title":"...","text":"...","category":"section"},...]
//! }
//! ```
//!
//! Loading accepts that framing or bare JSON. Individual records that do not
//! match the schema are skipped: a bad record only costs search recall.

use super::entry::{Category, SearchEntry};
use crate::error::LoadError;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;
use xxhash_rust::xxh3::xxh3_64;

/// Variable name the generator assigns the payload to.
pub const DEFAULT_VARIABLE: &str = "documenterSearchIndex";

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:var|let|const)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*")
        .expect("assignment pattern is valid")
});

#[derive(Serialize)]
struct PayloadRef<'a> {
    docs: &'a [SearchEntry],
}

/// An immutable, ordered collection of search entries.
///
/// Built once per documentation build and never mutated: the only read path
/// is [`SearchIndex::entries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIndex {
    variable: String,
    entries: Vec<SearchEntry>,
    skipped: usize,
}

impl SearchIndex {
    /// Build a payload from already-validated entries.
    pub fn from_entries(variable: impl Into<String>, entries: Vec<SearchEntry>) -> Self {
        Self {
            variable: variable.into(),
            entries,
            skipped: 0,
        }
    }

    /// Parse payload text, with or without the `var <name> = ` framing.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let (variable, body) = match ASSIGNMENT.captures(source) {
            Some(captures) => {
                let whole = captures.get(0).map_or(0, |m| m.end());
                (captures[1].to_string(), &source[whole..])
            }
            None => (DEFAULT_VARIABLE.to_string(), source),
        };
        let body = body.trim_end().trim_end_matches(';');

        let mut root: Value =
            serde_json::from_str(body).map_err(|e| LoadError::Parse(e.to_string()))?;

        let Some(Value::Array(records)) = root.get_mut("docs").map(Value::take) else {
            return Err(LoadError::MissingDocs);
        };

        if let Some(object) = root.as_object()
            && object.len() > 1
        {
            tracing::debug!(
                "Ignoring {} extra top-level keys in search index",
                object.len() - 1
            );
        }

        let total = records.len();
        let mut entries = Vec::with_capacity(total);
        let mut skipped = 0;

        for (position, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<SearchEntry>(record) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    skipped += 1;
                    tracing::warn!("Skipping malformed search entry #{}: {}", position, e);
                }
            }
        }

        tracing::debug!(
            "Parsed search index '{}': {} entries, {} skipped",
            variable,
            entries.len(),
            skipped
        );

        Ok(Self {
            variable,
            entries,
            skipped,
        })
    }

    /// Read and parse a payload file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                }
            }
        })?;

        let start = std::time::Instant::now();
        let index = Self::parse(&content)?;
        tracing::info!(
            "Loaded {} search entries from {} in {:?}",
            index.len(),
            path.display(),
            start.elapsed()
        );
        Ok(index)
    }

    /// The full ordered sequence of entries.
    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&SearchEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the global variable the payload is assigned to.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Number of records dropped while parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Serialize as bare JSON: `{"docs":[...]}`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&PayloadRef {
            docs: &self.entries,
        })
    }

    /// Serialize with the generator's JavaScript framing.
    pub fn to_js(&self) -> serde_json::Result<String> {
        let mut records = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            records.push(serde_json::to_string(entry)?);
        }
        Ok(format!(
            "var {} = {{\"docs\":\n[{}]\n}}\n",
            self.variable,
            records.join(",")
        ))
    }

    /// Content fingerprint of the entries, independent of framing.
    pub fn fingerprint(&self) -> u64 {
        // Serializing plain strings and unit enums cannot fail.
        let json = self.to_json().unwrap_or_default();
        xxh3_64(json.as_bytes())
    }

    /// Entry counts per category and page.
    pub fn stats(&self) -> IndexStats {
        let mut stats = IndexStats {
            total: self.entries.len(),
            skipped: self.skipped,
            ..IndexStats::default()
        };

        for entry in &self.entries {
            *stats.by_category.entry(entry.category).or_default() += 1;
            if !stats.pages.iter().any(|p| p.title == entry.page) {
                stats.pages.push(PageStats {
                    title: entry.page.clone(),
                    path: entry.location().page_path.to_string(),
                    by_category: BTreeMap::new(),
                });
            }
            if let Some(page) = stats.pages.iter_mut().find(|p| p.title == entry.page) {
                *page.by_category.entry(entry.category).or_default() += 1;
            }
        }

        stats
    }

    /// Check schema expectations that loading does not enforce.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut symbol_locations: HashMap<&str, usize> = HashMap::new();

        for (position, entry) in self.entries.iter().enumerate() {
            if entry.category.expects_text() && entry.text.trim().is_empty() {
                violations.push(Violation {
                    position,
                    kind: ViolationKind::MissingText,
                });
            }

            if entry.category == Category::Section && entry.location().anchor.is_none() {
                violations.push(Violation {
                    position,
                    kind: ViolationKind::SectionWithoutAnchor,
                });
            }

            if entry.category.is_symbol() {
                if let Some(&first) = symbol_locations.get(entry.location.as_str()) {
                    violations.push(Violation {
                        position,
                        kind: ViolationKind::DuplicateLocation { first },
                    });
                } else {
                    symbol_locations.insert(&entry.location, position);
                }
            }
        }

        violations
    }
}

/// Aggregate counts for a loaded payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub total: usize,
    pub skipped: usize,
    pub by_category: BTreeMap<Category, usize>,
    /// Pages in first-seen order.
    pub pages: Vec<PageStats>,
}

impl IndexStats {
    pub fn count(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStats {
    pub title: String,
    pub path: String,
    pub by_category: BTreeMap<Category, usize>,
}

/// A record that loaded but breaks a schema expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Position of the offending entry.
    pub position: usize,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// A `type` or `method` entry with an empty docstring.
    MissingText,
    /// A `section` entry whose location has no anchor.
    SectionWithoutAnchor,
    /// Two API entries share one anchor.
    DuplicateLocation { first: usize },
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingText => f.write_str("API entry has no text"),
            Self::SectionWithoutAnchor => f.write_str("section location has no anchor"),
            Self::DuplicateLocation { first } => {
                write!(f, "location already used by entry #{}", first)
            }
        }
    }
}
