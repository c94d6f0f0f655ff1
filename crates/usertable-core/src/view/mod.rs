//! Paginated window over the synced records.

pub mod table;

pub use table::{Pager, TableView, DEFAULT_PAGE_SIZE};
