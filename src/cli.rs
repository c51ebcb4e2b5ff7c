//! Command-line interface.

use crate::format::DetailLevel;
use crate::index::Category;
use crate::tracing::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "docsearch-mcp", version)]
#[command(about = "Search generated documentation indexes, over MCP or from the shell", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "DOCSEARCH_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Index source as NAME=PATH or PATH. May be repeated.
    #[arg(
        long = "index",
        global = true,
        env = "DOCSEARCH_INDEX",
        value_delimiter = ',',
        value_name = "NAME=PATH"
    )]
    pub indexes: Vec<String>,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Do not read or write the on-disk term index cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Search an index and print ranked results
    Search {
        query: String,
        /// Index name. Defaults to the first configured index.
        #[arg(long)]
        name: Option<String>,
        /// Restrict results to these categories
        #[arg(short, long, value_enum, value_delimiter = ',')]
        category: Vec<Category>,
        /// Restrict results to one page title
        #[arg(short, long)]
        page: Option<String>,
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
    /// Show one entry by location, title or symbol name
    Inspect {
        target: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long, value_enum, default_value_t = DetailLevel::High)]
        detail: DetailLevel,
    },
    /// Check a search_index.js file for structural issues
    Validate { path: PathBuf },
    /// Print per-category and per-page counts for a search_index.js file
    Stats { path: PathBuf },
    /// Re-serialize a search_index.js file
    Export {
        path: PathBuf,
        /// Output file. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write bare JSON instead of the `var` assignment
        #[arg(long)]
        json: bool,
    },
}
