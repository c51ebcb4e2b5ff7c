use crate::config::{IndexSource, default_source_name, expand_tilde};
use crate::error::Result;
use crate::tools::list_pages::category_counts;
use crate::worker::IndexState;
use anyhow::{Context, bail};
use ignore::WalkBuilder;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name the documentation generator writes its search index to.
pub const INDEX_FILE_NAME: &str = "search_index.js";

/// Directories deeper than this are not searched for index files.
const MAX_DISCOVERY_DEPTH: usize = 6;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoadIndexRequest {
    /// Path to a search_index.js file, or a directory to scan for them
    pub path: String,
    /// Name to register the index under. Defaults to the containing directory name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Find index files under `path`.
///
/// A file path is used as-is. A directory is walked (respecting `.gitignore`)
/// for files named `search_index.js`; each is named after its parent
/// directory. `name` applies only when exactly one source is found.
pub fn discover_sources(path: &Path, name: Option<&str>) -> Result<Vec<IndexSource>> {
    let path = PathBuf::from(&*expand_tilde(&path.to_string_lossy()));
    let canonical = std::fs::canonicalize(&path)
        .with_context(|| format!("Path does not exist: {}", path.display()))?;

    let files: Vec<PathBuf> = if canonical.is_file() {
        vec![canonical.clone()]
    } else {
        let mut found: Vec<PathBuf> = WalkBuilder::new(&canonical)
            .max_depth(Some(MAX_DISCOVERY_DEPTH))
            .hidden(true)
            .build()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .filter(|entry| entry.file_name() == INDEX_FILE_NAME)
            .map(ignore::DirEntry::into_path)
            .collect();
        found.sort();
        found
    };

    if files.is_empty() {
        bail!(
            "No {} found under {}",
            INDEX_FILE_NAME,
            canonical.display()
        );
    }

    let single = files.len() == 1;
    let mut sources: Vec<IndexSource> = Vec::with_capacity(files.len());
    for file in files {
        let base = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) if single => name.to_string(),
            _ => default_source_name(&file),
        };

        // Disambiguate sibling builds that share a directory name
        let mut candidate = base.clone();
        let mut suffix = 2;
        while sources.iter().any(|s| s.name == candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        sources.push(IndexSource {
            name: candidate,
            path: file,
        });
    }

    tracing::debug!(
        "Discovered {} index sources under {}",
        sources.len(),
        canonical.display()
    );

    Ok(sources)
}

/// Register and eagerly load the index (or indexes) at `request.path`.
pub async fn handle_load_index(state: &Arc<IndexState>, request: LoadIndexRequest) -> Result<String> {
    let path = PathBuf::from(&request.path);
    let name = request.name.clone();
    let sources =
        tokio::task::spawn_blocking(move || discover_sources(&path, name.as_deref()))
            .await
            .context("Index discovery task failed")??;

    let mut output = String::new();

    for source in sources {
        let changed = state.register(source.clone()).await;
        match state.get(Some(&source.name)).await {
            Ok(index) => {
                let stats = index.payload.stats();
                let status = if changed { "Loaded" } else { "Already registered" };
                writeln!(
                    output,
                    "{} '{}' from {}",
                    status,
                    source.name,
                    source.path.display()
                )?;
                writeln!(
                    output,
                    "  {} entries across {} pages ({})",
                    stats.total,
                    stats.pages.len(),
                    category_counts(&stats)
                )?;
                if stats.skipped > 0 {
                    writeln!(output, "  {} malformed records skipped", stats.skipped)?;
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load index '{}': {}", source.name, e);
                writeln!(output, "Failed to load '{}': {}", source.name, e)?;
            }
        }
    }

    if let Some(default) = state.sources().await.first() {
        writeln!(output, "\nDefault index: '{}'", default.name)?;
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    const PAYLOAD: &str = r##"var documenterSearchIndex = {"docs":
[{"location":"#Overview","page":"Welcome Page","title":"Overview","text":"","category":"section"}]
}
"##;

    #[test]
    fn test_discover_single_file_uses_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(INDEX_FILE_NAME);
        std::fs::write(&file, PAYLOAD).unwrap();

        let sources = discover_sources(&file, Some("hydro")).unwrap();
        check!(sources.len() == 1);
        check!(sources[0].name == "hydro");
    }

    #[test]
    fn test_discover_directory() {
        let dir = tempfile::tempdir().unwrap();
        for site in ["hydro/build", "psi/build", "psi/dev"] {
            let site_dir = dir.path().join(site);
            std::fs::create_dir_all(&site_dir).unwrap();
            std::fs::write(site_dir.join(INDEX_FILE_NAME), PAYLOAD).unwrap();
        }
        std::fs::write(dir.path().join("notes.js"), "var x = 1;").unwrap();

        let sources = discover_sources(dir.path(), Some("ignored")).unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name.as_str()).collect();
        check!(names == vec!["build", "build-2", "dev"]);
    }

    #[test]
    fn test_discover_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        check!(discover_sources(dir.path(), None).is_err());
    }
}
