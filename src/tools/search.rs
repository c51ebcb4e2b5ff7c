//! TF-IDF search handler for finding documentation entries.

use crate::error::Result;
use crate::format::truncate;
use crate::index::Category;
use crate::search::{SearchHit, SearchQuery};
use crate::worker::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Search query term
    pub query: String,
    /// Index to search. Defaults to the first configured index.
    #[serde(default)]
    pub index: Option<String>,
    /// Only return entries of these categories
    #[serde(default)]
    pub category: Option<Vec<Category>>,
    /// Only return entries from this page title
    #[serde(default)]
    pub page: Option<String>,
    /// Maximum number of results to return (default: 10)
    #[serde(default = "default_limit")]
    pub limit: Option<usize>,
}

fn default_limit() -> Option<usize> {
    Some(10)
}

/// Execute the search operation using TF-IDF indexing.
pub async fn handle_search(state: &Arc<IndexState>, request: SearchRequest) -> Result<String> {
    let index = state.get(request.index.as_deref()).await?;

    let query = SearchQuery::new(&request.query)
        .with_categories(request.category.clone().unwrap_or_default())
        .with_page(request.page.as_deref())
        .with_limit(request.limit.unwrap_or(10));

    let results = index.search(&query);

    if results.is_empty() {
        let mut msg = format!(
            "No results found for '{}' in index '{}'.\n\n",
            request.query, index.name
        );

        msg.push_str("Search tips:\n");
        msg.push_str("• Try a shorter or more general term\n");
        msg.push_str("• Search for symbol names like 'HydroEnergyOutput'\n");
        msg.push_str("• Search uses stemming: 'constraints' matches 'constraint'\n");
        if request.category.is_some() || request.page.is_some() {
            msg.push_str("• Remove the category or page filter to widen the search\n");
        }

        return Ok(msg);
    }

    Ok(format_search_results(&results, &request.query, &index.name))
}

/// Format search results into a readable string output.
pub fn format_search_results(results: &[SearchHit<'_>], query: &str, index_name: &str) -> String {
    let mut output = format!("Search results for '{}' in '{}':\n\n", query, index_name);

    let max_score = results
        .first()
        .map(|r| r.rank)
        .filter(|r| *r > 0.0)
        .unwrap_or(1.0);

    for (idx, result) in results.iter().enumerate() {
        let relevance = ((result.rank / max_score) * 100.0).round().clamp(0.0, 100.0) as u8;
        let entry = result.entry;

        let _ = writeln!(
            output,
            "{}. `{}` ({}) - relevance: {}%",
            idx + 1,
            entry.title,
            entry.category,
            relevance
        );
        let _ = writeln!(output, "   {} › {}", entry.page, entry.location);

        if let Some(summary) = entry.summary() {
            let _ = writeln!(output, "   {}", truncate(summary, 160));
        }

        output.push('\n');
    }

    output
}
