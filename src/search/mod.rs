//! Full-text search infrastructure for documentation search indexes.
//!
//! This module provides TF-IDF based search over search entries, including
//! tokenization, indexing, scoring, caching, and query resolution.

pub(crate) mod index;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

pub use index::{IndexCache, InvertedIndex};
pub use query::{Lookup, SUGGESTION_THRESHOLD, SearchHit, SearchQuery, Suggestion, execute, lookup, suggest};
pub use scoring::{calculate_relevance, title_relevance};
