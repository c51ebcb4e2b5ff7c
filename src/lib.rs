pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod index;
pub mod search;
pub mod server;
pub mod tools;
pub mod tracing;
pub mod worker;

pub use config::{Config, IndexSource};
pub use error::{ConfigError, LoadError, Result};
pub use index::{Category, SearchEntry, SearchIndex};
pub use server::IndexServer;
pub use worker::{IndexState, LoadedIndex};
