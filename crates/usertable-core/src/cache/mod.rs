//! Local record cache.
//!
//! `RecordCache` holds the canonical in-memory view of the user collection,
//! loaded once from the remote store and afterwards mutated only by the
//! sync controller. Nothing is persisted; the cache lives as long as the process.

pub mod record_cache;

pub use record_cache::{CacheError, RecordCache};
