//! Formatting utilities for search results and entries.

use crate::index::SearchEntry;
use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

/// DetailLevel level for entry display.
///
/// DO NOT add doc comments to individual variants - this causes schemars to generate
/// `oneOf` schemas instead of simple `enum` arrays, breaking MCP client enum handling.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Lines of body text shown at medium detail.
const MEDIUM_TEXT_LINES: usize = 12;

/// Truncate text to a maximum number of characters, appending an ellipsis.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated.trim_end())
    }
}

/// Collapse the blank-line padding the generator leaves after docstrings.
pub fn normalize_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = true;

    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(line.trim_end());
        previous_blank = blank;
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

/// Render one entry at the requested detail level.
pub fn write_entry(
    output: &mut String,
    position: usize,
    entry: &SearchEntry,
    detail: DetailLevel,
) -> fmt::Result {
    writeln!(output, "{} ({})", entry.title, entry.category)?;
    writeln!(output, "  location: {}", entry.location)?;
    writeln!(output, "  page: {}", entry.page)?;

    if detail == DetailLevel::High {
        let location = entry.location();
        writeln!(output, "  position: #{}", position)?;
        if let Some(anchor) = location.anchor {
            writeln!(output, "  anchor: {}", anchor)?;
        }
    }

    let text = normalize_text(&entry.text);
    if text.is_empty() {
        if entry.category.expects_text() {
            writeln!(output, "  <no documentation>")?;
        }
        return Ok(());
    }

    writeln!(output)?;
    match detail {
        DetailLevel::Low => {
            if let Some(summary) = entry.summary() {
                writeln!(output, "  {}", truncate(summary, 120))?;
            }
        }
        DetailLevel::Medium => {
            let lines: Vec<&str> = text.lines().collect();
            for line in lines.iter().take(MEDIUM_TEXT_LINES) {
                writeln!(output, "  {}", line)?;
            }
            if lines.len() > MEDIUM_TEXT_LINES {
                writeln!(
                    output,
                    "  ... {} more lines (use detail_level=high)",
                    lines.len() - MEDIUM_TEXT_LINES
                )?;
            }
        }
        DetailLevel::High => {
            for line in text.lines() {
                writeln!(output, "  {}", line)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Category;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case("short", 10, "short")]
    #[case("Parameter to define energy limit", 12, "Parameter...")]
    fn test_truncate(#[case] input: &str, #[case] max: usize, #[case] expected: &str) {
        check!(truncate(input, max) == expected);
    }

    #[rstest]
    #[case("Parameter to define energy target\n\n\n\n\n\n", "Parameter to define energy target")]
    #[case("\n\nFields:\n\n\n\nname  \n", "Fields:\n\nname")]
    #[case("", "")]
    fn test_normalize_text(#[case] input: &str, #[case] expected: &str) {
        check!(normalize_text(input) == expected);
    }

    #[test]
    fn test_write_entry_levels() {
        let entry = SearchEntry::new(
            "api/public/#HydroPowerSimulations.ReservoirLimitParameter",
            "Public API Reference",
            "HydroPowerSimulations.ReservoirLimitParameter",
            "Parameter to define energy limit\n\n\n\n\n\n",
            Category::Type,
        );

        let mut low = String::new();
        write_entry(&mut low, 3, &entry, DetailLevel::Low).unwrap();
        check!(low.contains("HydroPowerSimulations.ReservoirLimitParameter (type)"));
        check!(low.contains("Parameter to define energy limit"));
        check!(!low.contains("position"));

        let mut high = String::new();
        write_entry(&mut high, 3, &entry, DetailLevel::High).unwrap();
        check!(high.contains("position: #3"));
        check!(high.contains("anchor: HydroPowerSimulations.ReservoirLimitParameter"));
    }

    #[test]
    fn test_write_entry_missing_docs() {
        let entry = SearchEntry::new("api/#Foo", "API", "M.Foo", "", Category::Method);
        let mut output = String::new();
        write_entry(&mut output, 0, &entry, DetailLevel::Medium).unwrap();
        check!(output.contains("<no documentation>"));
    }
}
