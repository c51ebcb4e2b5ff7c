pub mod inspect_entry;
pub mod list_pages;
pub mod load_index;
pub mod search;

pub use inspect_entry::*;
pub use list_pages::*;
pub use load_index::*;
pub use search::*;
