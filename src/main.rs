use anyhow::{Context, bail};
use clap::Parser;
use docsearch_mcp::cli::{Cli, Commands};
use docsearch_mcp::config::{Config, IndexSource, default_source_name};
use docsearch_mcp::format::DetailLevel;
use docsearch_mcp::index::SearchIndex;
use docsearch_mcp::server::IndexServer;
use docsearch_mcp::tools::{
    InspectEntryRequest, SearchRequest, handle_inspect_entry, handle_search, render_summary,
};
use docsearch_mcp::worker::{IndexState, LoadedIndex, spawn_reload_worker};
use rmcp::{ServiceExt, transport::stdio};
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    docsearch_mcp::tracing::init(cli.log_format);

    let mut config = Config::resolve(cli.config.as_deref(), &cli.indexes)?;
    if cli.no_cache {
        config.cache_dir = None;
    }

    match cli.command {
        None | Some(Commands::Serve) => serve(config).await,
        Some(Commands::Search {
            query,
            name,
            category,
            page,
            limit,
        }) => {
            let state = Arc::new(IndexState::new(&config));
            let request = SearchRequest {
                query,
                index: name,
                category: (!category.is_empty()).then_some(category),
                page,
                limit: Some(limit),
            };
            print!("{}", handle_search(&state, request).await?);
            Ok(())
        }
        Some(Commands::Inspect {
            target,
            name,
            detail,
        }) => {
            let state = Arc::new(IndexState::new(&config));
            let request = InspectEntryRequest {
                target,
                index: name,
                detail_level: detail,
            };
            print!("{}", handle_inspect_entry(&state, request).await?);
            Ok(())
        }
        Some(Commands::Validate { path }) => validate(&path),
        Some(Commands::Stats { path }) => {
            let source = IndexSource {
                name: default_source_name(&path),
                path,
            };
            let index = LoadedIndex::load(&source, None)?;
            print!("{}", render_summary(&index, DetailLevel::Medium)?);
            Ok(())
        }
        Some(Commands::Export { path, output, json }) => {
            let payload = SearchIndex::load(&path)?;
            let content = if json {
                payload.to_json()?
            } else {
                payload.to_js()?
            };

            match output {
                Some(output) => std::fs::write(&output, content)
                    .with_context(|| format!("Failed to write {}", output.display()))?,
                None => std::io::stdout().write_all(content.as_bytes())?,
            }
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting docsearch-mcp MCP server with {} configured indexes",
        config.sources.len()
    );

    let state = Arc::new(IndexState::new(&config));
    let cancel = CancellationToken::new();
    let worker = spawn_reload_worker(state.clone(), config.reload_interval, cancel.clone());

    let server = IndexServer::new(state);
    let service = server.serve(stdio()).await.inspect_err(|e| {
        tracing::error!("Error serving MCP server: {:?}", e);
    })?;

    service.waiting().await?;

    cancel.cancel();
    if let Some(worker) = worker {
        let _ = worker.await;
    }

    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let payload = SearchIndex::load(path)?;
    let violations = payload.validate();

    println!(
        "{}: {} entries, {} malformed records skipped",
        path.display(),
        payload.len(),
        payload.skipped()
    );

    for violation in &violations {
        let title = payload
            .get(violation.position)
            .map_or("<unknown>", |e| e.title.as_str());
        println!("  #{} `{}`: {}", violation.position, title, violation.kind);
    }

    if !violations.is_empty() {
        bail!("{} issues found in {}", violations.len(), path.display());
    }

    println!("No issues found");
    Ok(())
}
