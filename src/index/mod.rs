//! The search index payload: entry records and the `search_index.js` codec.

pub mod entry;
pub mod payload;

pub use entry::{Category, Location, SearchEntry};
pub use payload::{
    DEFAULT_VARIABLE, IndexStats, PageStats, SearchIndex, Violation, ViolationKind,
};
