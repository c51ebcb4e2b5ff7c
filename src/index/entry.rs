//! Search entry records and their derived views.

use rmcp::schemars;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a search entry's origin.
///
/// DO NOT add doc comments to individual variants - this causes schemars to generate
/// `oneOf` schemas instead of simple `enum` arrays, breaking MCP client enum handling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    schemars::JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Section,
    Page,
    Type,
    Method,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 4] = [Self::Page, Self::Section, Self::Type, Self::Method];

    /// Whether entries of this category are expected to carry docstring text.
    ///
    /// API symbols (`type`, `method`) always have a docstring; pages and
    /// sections may legitimately have an empty body.
    pub const fn expects_text(self) -> bool {
        matches!(self, Self::Type | Self::Method)
    }

    /// Whether the entry describes an API symbol rather than prose.
    pub const fn is_symbol(self) -> bool {
        self.expects_text()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Page => "page",
            Self::Type => "type",
            Self::Method => "method",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of the search index.
///
/// Field order matches the generator's output so serialization reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
    /// Page URL plus optional `#anchor`, e.g. `api/public/#HydroPowerSimulations.Foo`.
    pub location: String,
    /// Human-readable page title.
    pub page: String,
    /// Section or symbol title.
    pub title: String,
    /// Plain-text body, already stripped of markup. May be empty.
    pub text: String,
    pub category: Category,
}

impl SearchEntry {
    pub fn new(
        location: impl Into<String>,
        page: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            location: location.into(),
            page: page.into(),
            title: title.into(),
            text: text.into(),
            category,
        }
    }

    /// Split location into page path and anchor.
    pub fn location(&self) -> Location<'_> {
        Location::parse(&self.location)
    }

    /// Unqualified symbol name for API entries.
    ///
    /// `HydroPowerSimulations.WaterSpillageVariable` → `WaterSpillageVariable`.
    /// Titles of prose entries are returned unchanged.
    pub fn symbol_name(&self) -> &str {
        if !self.category.is_symbol() {
            return &self.title;
        }
        self.title
            .rsplit_once('.')
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.title)
    }

    /// First non-blank line of the body, trimmed.
    pub fn summary(&self) -> Option<&str> {
        self.text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
    }
}

/// A parsed `location` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    /// Page path without the fragment, e.g. `api/public/`.
    pub page_path: &'a str,
    /// Fragment after `#`, if present and non-empty.
    pub anchor: Option<&'a str>,
}

impl<'a> Location<'a> {
    pub fn parse(location: &'a str) -> Self {
        match location.split_once('#') {
            Some((page_path, anchor)) => Self {
                page_path,
                anchor: (!anchor.is_empty()).then_some(anchor),
            },
            None => Self {
                page_path: location,
                anchor: None,
            },
        }
    }
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.anchor {
            Some(anchor) => write!(f, "{}#{}", self.page_path, anchor),
            None => f.write_str(self.page_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[test]
    fn test_quick_start_section_loads() {
        let json = r#"{"location":"quick_start_guide/#Quick-Start-Guide","page":"Quick Start Guide","title":"Quick Start Guide","text":"","category":"section"}"#;
        let entry: SearchEntry = serde_json::from_str(json).unwrap();
        check!(entry.category == Category::Section);
        check!(entry.text.is_empty());
        check!(entry.page == "Quick Start Guide");
    }

    #[rstest]
    #[case(Category::Section, false)]
    #[case(Category::Page, false)]
    #[case(Category::Type, true)]
    #[case(Category::Method, true)]
    fn test_expects_text(#[case] category: Category, #[case] expected: bool) {
        check!(category.expects_text() == expected);
    }

    #[rstest]
    #[case("\"section\"", Category::Section)]
    #[case("\"method\"", Category::Method)]
    fn test_category_wire_names(#[case] json: &str, #[case] expected: Category) {
        let category: Category = serde_json::from_str(json).unwrap();
        check!(category == expected);
        check!(serde_json::to_string(&category).unwrap() == json);
    }

    #[test]
    fn test_unknown_category_rejected() {
        check!(serde_json::from_str::<Category>("\"macro\"").is_err());
    }

    #[rstest]
    #[case("api/public/#HydroPowerSimulations.Foo", "api/public/", Some("HydroPowerSimulations.Foo"))]
    #[case("quick_start_guide/", "quick_start_guide/", None)]
    #[case("index.html#", "index.html", None)]
    #[case("", "", None)]
    fn test_location_parse(
        #[case] input: &str,
        #[case] page_path: &str,
        #[case] anchor: Option<&str>,
    ) {
        let location = Location::parse(input);
        check!(location.page_path == page_path);
        check!(location.anchor == anchor);
    }

    #[rstest]
    #[case("HydroPowerSimulations.WaterSpillageVariable", Category::Type, "WaterSpillageVariable")]
    #[case("PowerSimulations.construct_device!", Category::Method, "construct_device!")]
    #[case("Quick Start Guide", Category::Section, "Quick Start Guide")]
    #[case("Formulations.", Category::Type, "Formulations.")]
    fn test_symbol_name(#[case] title: &str, #[case] category: Category, #[case] expected: &str) {
        let entry = SearchEntry::new("x/", "X", title, "doc", category);
        check!(entry.symbol_name() == expected);
    }

    #[test]
    fn test_summary_skips_blank_lines() {
        let entry = SearchEntry::new(
            "api/#Foo",
            "API",
            "Foo",
            "\n\n  Parameter to define energy target  \n\nmore",
            Category::Type,
        );
        check!(entry.summary() == Some("Parameter to define energy target"));
    }
}
