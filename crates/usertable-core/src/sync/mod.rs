//! Synchronization between the local cache and the remote store.
//!
//! - `SyncController`: owns the cache and edit session, issues store requests
//!   and applies their responses
//! - `SyncReport` / `SyncOutcome`: per-request results for the front end
//! - `RollbackPolicy`: what a failed optimistic save does to the cache

pub mod controller;
pub mod outcome;

pub use controller::SyncController;
pub use outcome::{RequestId, RollbackPolicy, SyncError, SyncOp, SyncOutcome, SyncReport};
