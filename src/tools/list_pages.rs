use crate::error::Result;
use crate::format::DetailLevel;
use crate::index::{Category, IndexStats};
use crate::worker::{IndexState, LoadedIndex};
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

/// Violations listed individually at high detail before summarizing.
const MAX_LISTED_VIOLATIONS: usize = 20;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListPagesRequest {
    /// Index to summarize. Defaults to the first configured index.
    #[serde(default)]
    pub index: Option<String>,
    /// Detail level: low (totals only), medium (+ pages), high (+ validation findings)
    #[serde(default)]
    pub detail_level: DetailLevel,
}

/// Handles list_pages requests by summarizing an index page by page.
pub async fn handle_list_pages(
    state: &Arc<IndexState>,
    request: ListPagesRequest,
) -> Result<String> {
    let index = state.get(request.index.as_deref()).await?;
    render_summary(&index, request.detail_level)
}

/// Render the page summary for a loaded index.
pub fn render_summary(index: &LoadedIndex, detail: DetailLevel) -> Result<String> {
    let stats = index.payload.stats();
    let mut output = String::new();

    writeln!(
        output,
        "Index '{}' ({}): {} entries",
        index.name,
        index.path.display(),
        stats.total
    )?;
    writeln!(output, "  {}", category_counts(&stats))?;
    if stats.skipped > 0 {
        writeln!(output, "  {} malformed records skipped", stats.skipped)?;
    }
    writeln!(output)?;

    if detail == DetailLevel::Low {
        return Ok(output);
    }

    writeln!(output, "Pages ({}):", stats.pages.len())?;
    for page in &stats.pages {
        let total: usize = page.by_category.values().sum();
        let path = if page.path.is_empty() {
            "/"
        } else {
            page.path.as_str()
        };
        write!(output, "  • {} [{}] - {} entries", page.title, path, total)?;

        let symbols = page.by_category.get(&Category::Type).copied().unwrap_or(0)
            + page.by_category.get(&Category::Method).copied().unwrap_or(0);
        if symbols > 0 {
            write!(output, " ({} API symbols)", symbols)?;
        }
        writeln!(output)?;
    }
    writeln!(output)?;

    let violations = index.payload.validate();
    if violations.is_empty() {
        writeln!(output, "Validation: no issues")?;
        return Ok(output);
    }

    writeln!(output, "Validation: {} issues", violations.len())?;
    if detail == DetailLevel::High {
        for violation in violations.iter().take(MAX_LISTED_VIOLATIONS) {
            let title = index
                .payload
                .get(violation.position)
                .map_or("<unknown>", |e| e.title.as_str());
            writeln!(
                output,
                "  • #{} `{}`: {}",
                violation.position, title, violation.kind
            )?;
        }
        if violations.len() > MAX_LISTED_VIOLATIONS {
            writeln!(
                output,
                "  ... and {} more",
                violations.len() - MAX_LISTED_VIOLATIONS
            )?;
        }
    }

    Ok(output)
}

/// One-line category breakdown, e.g. `page: 7, section: 5, type: 21, method: 30`.
pub fn category_counts(stats: &IndexStats) -> String {
    Category::ALL
        .iter()
        .map(|category| format!("{}: {}", category, stats.count(*category)))
        .collect::<Vec<_>>()
        .join(", ")
}
