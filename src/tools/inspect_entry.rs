use crate::error::Result;
use crate::format::{DetailLevel, write_entry};
use crate::search::{Lookup, Suggestion};
use crate::worker::IndexState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InspectEntryRequest {
    /// Entry location (`api/public/#Pkg.Name`), full title (`Pkg.Name`), or symbol name (`Name`)
    pub target: String,
    /// Index to inspect. Defaults to the first configured index.
    #[serde(default)]
    pub index: Option<String>,
    /// Detail level: low (first line), medium (abridged text), high (full text + anchor)
    #[serde(default)]
    pub detail_level: DetailLevel,
}

/// Handles inspect_entry requests by showing every entry that matches the target.
///
/// Methods are documented once per signature, so a single title can expand to
/// several entries; each is rendered in payload order.
pub async fn handle_inspect_entry(
    state: &Arc<IndexState>,
    request: InspectEntryRequest,
) -> Result<String> {
    let index = state.get(request.index.as_deref()).await?;
    let mut output = String::new();

    match index.lookup(&request.target) {
        Lookup::Found(entries) => {
            if entries.len() > 1 {
                writeln!(
                    output,
                    "{} entries match '{}':\n",
                    entries.len(),
                    request.target
                )?;
            }
            for (position, entry) in entries {
                write_entry(&mut output, position, entry, request.detail_level)?;
                output.push('\n');
            }
        }
        Lookup::NotFound(suggestions) => {
            writeln!(
                output,
                "No entry '{}' in index '{}'.",
                request.target, index.name
            )?;
            write_suggestions(&mut output, &suggestions)?;
        }
    }

    Ok(output)
}

/// Render suggestions already ranked and thresholded by `suggest`.
fn write_suggestions(output: &mut String, suggestions: &[Suggestion]) -> std::fmt::Result {
    if suggestions.is_empty() {
        return writeln!(output, "Use the search tool to find entries by keyword.");
    }

    writeln!(output, "\nDid you mean one of these?\n")?;
    for suggestion in suggestions {
        writeln!(output, "• `{}` ({})", suggestion.title, suggestion.category)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Category;
    use crate::search::SUGGESTION_THRESHOLD;
    use assert2::check;

    #[test]
    fn test_suggestion_at_threshold_is_shown() {
        let suggestions = [Suggestion {
            title: "HydroPowerSimulations.HydroEnergyOutput".to_string(),
            category: Category::Type,
            score: SUGGESTION_THRESHOLD,
        }];

        let mut output = String::new();
        write_suggestions(&mut output, &suggestions).unwrap();
        check!(output.contains("Did you mean"));
        check!(output.contains("• `HydroPowerSimulations.HydroEnergyOutput` (type)"));
    }

    #[test]
    fn test_no_suggestions_points_to_search() {
        let mut output = String::new();
        write_suggestions(&mut output, &[]).unwrap();
        check!(output.contains("Use the search tool"));
    }
}
