//! Query execution over a loaded index: ranked search with filters, and
//! direct entry lookup with fuzzy suggestions.

use super::index::InvertedIndex;
use super::scoring::{boosted_rank, title_relevance};
use crate::index::{Category, SearchEntry, SearchIndex};
use rapidfuzz::distance::jaro_winkler;
use std::collections::HashMap;

/// Minimum Jaro-Winkler similarity for a lookup suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Maximum number of suggestions returned for a failed lookup.
const MAX_SUGGESTIONS: usize = 5;

/// A full-text query with optional filters.
#[derive(Debug, Clone)]
pub struct SearchQuery<'q> {
    pub text: &'q str,
    /// Restrict results to these categories. Empty means all.
    pub categories: Vec<Category>,
    /// Restrict results to a page title (case-insensitive).
    pub page: Option<&'q str>,
    pub limit: usize,
}

impl<'q> SearchQuery<'q> {
    pub fn new(text: &'q str) -> Self {
        Self {
            text,
            categories: Vec::new(),
            page: None,
            limit: 10,
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_page(mut self, page: Option<&'q str>) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    fn accepts(&self, entry: &SearchEntry) -> bool {
        (self.categories.is_empty() || self.categories.contains(&entry.category))
            && self
                .page
                .is_none_or(|page| entry.page.eq_ignore_ascii_case(page.trim()))
    }
}

/// A ranked search result.
#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    /// Position of the entry in the payload
    pub position: usize,
    pub entry: &'a SearchEntry,
    pub rank: f32,
}

/// Run a query: TF-IDF ranking plus a bonus for title matches.
pub fn execute<'a>(
    payload: &'a SearchIndex,
    terms: &InvertedIndex,
    query: &SearchQuery<'_>,
) -> Vec<SearchHit<'a>> {
    if query.limit == 0 {
        return vec![];
    }

    let mut ranks: HashMap<usize, f32> = terms
        .search(query.text, usize::MAX)
        .into_iter()
        .filter(|(position, _)| *position < payload.len())
        .collect();

    let top_rank = ranks.values().copied().fold(0.0_f32, f32::max);

    // Title matches catch symbols whose names tokenize poorly, e.g. `construct_device!`.
    for (position, entry) in payload.entries().iter().enumerate() {
        if let Some(score) = title_relevance(entry, query.text) {
            let rank = ranks.entry(position).or_insert(0.0);
            *rank = boosted_rank(*rank, Some(score), top_rank);
        }
    }

    let mut hits: Vec<SearchHit<'a>> = ranks
        .into_iter()
        .filter_map(|(position, rank)| {
            let entry = payload.get(position)?;
            query.accepts(entry).then_some(SearchHit {
                position,
                entry,
                rank,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.rank.total_cmp(&a.rank).then(a.position.cmp(&b.position)));
    hits.truncate(query.limit);

    tracing::debug!(
        "Query '{}' matched {} entries (limit {})",
        query.text,
        hits.len(),
        query.limit
    );

    hits
}

/// A fuzzy lookup suggestion with relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub title: String,
    pub category: Category,
    /// Similarity from 0.0 to 1.0, higher is better
    pub score: f64,
}

/// Outcome of an entry lookup.
#[derive(Debug)]
pub enum Lookup<'a> {
    /// Matching entries with their positions, in payload order.
    Found(Vec<(usize, &'a SearchEntry)>),
    /// Nothing matched; closest titles, best first.
    NotFound(Vec<Suggestion>),
}

/// Find entries by exact location, exact title, or unqualified symbol name.
///
/// Documenter emits one entry per method signature, so a title can resolve to
/// several entries; all of them are returned.
pub fn lookup<'a>(payload: &'a SearchIndex, target: &str) -> Lookup<'a> {
    let target = target.trim();
    let entries = payload.entries().iter().enumerate();

    let by_location: Vec<_> = entries
        .clone()
        .filter(|(_, e)| e.location == target)
        .collect();
    if !by_location.is_empty() {
        return Lookup::Found(by_location);
    }

    let by_title: Vec<_> = entries
        .clone()
        .filter(|(_, e)| e.title == target)
        .collect();
    if !by_title.is_empty() {
        return Lookup::Found(by_title);
    }

    let by_symbol: Vec<_> = entries
        .filter(|(_, e)| e.symbol_name().eq_ignore_ascii_case(target))
        .collect();
    if !by_symbol.is_empty() {
        return Lookup::Found(by_symbol);
    }

    Lookup::NotFound(suggest(payload, target))
}

/// Rank entry titles by similarity to `target`.
pub fn suggest(payload: &SearchIndex, target: &str) -> Vec<Suggestion> {
    let target = target.to_lowercase();
    let mut best: HashMap<&str, Suggestion> = HashMap::new();

    for entry in payload.entries() {
        let title_score = jaro_winkler::similarity(target.chars(), entry.title.to_lowercase().chars());
        let symbol_score =
            jaro_winkler::similarity(target.chars(), entry.symbol_name().to_lowercase().chars());
        let score = title_score.max(symbol_score);

        if score < SUGGESTION_THRESHOLD {
            continue;
        }

        best.entry(entry.title.as_str())
            .and_modify(|s| s.score = s.score.max(score))
            .or_insert_with(|| Suggestion {
                title: entry.title.clone(),
                category: entry.category,
                score,
            });
    }

    let mut suggestions: Vec<_> = best.into_values().collect();
    suggestions.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.title.cmp(&b.title)));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
