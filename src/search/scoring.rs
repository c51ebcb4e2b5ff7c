//! Search relevance and ranking helpers.

use crate::index::SearchEntry;

/// Calculate simple text relevance score.
///
/// Returns a score based on how well the query matches the text:
/// - 100: Exact match
/// - 50: Text starts with query
/// - 10: Text contains query
/// - None: No match
pub fn calculate_relevance(text: &str, query: &str) -> Option<u32> {
    if text == query {
        Some(100)
    } else if text.starts_with(query) {
        Some(50)
    } else if text.contains(query) {
        Some(10)
    } else {
        None
    }
}

/// Best case-insensitive title relevance of an entry for a query.
///
/// Both the full title (`HydroPowerSimulations.HydroEnergyOutput`) and the
/// unqualified symbol name (`HydroEnergyOutput`) are considered.
pub fn title_relevance(entry: &SearchEntry, query: &str) -> Option<u32> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }

    let title = entry.title.to_lowercase();
    let symbol = entry.symbol_name().to_lowercase();

    calculate_relevance(&title, &query).max(calculate_relevance(&symbol, &query))
}

/// Combine a TF-IDF rank with a title match bonus.
///
/// The bonus is a fraction of the best TF-IDF score in the result set, so an
/// exact title hit always lands at or above the best full-text match.
pub fn boosted_rank(rank: f32, title_score: Option<u32>, top_rank: f32) -> f32 {
    match title_score {
        Some(score) => rank + top_rank.max(1.0) * (score as f32 / 100.0),
        None => rank,
    }
}
