//! Usertable core - a local, editable mirror of a remote user collection.
//!
//! The record cache is filled once from the remote store. Rows are edited one
//! at a time through an edit session; saves are committed to the cache before
//! the store answers, deletes only after it confirms. The sync controller owns
//! both and applies store responses as they come back.
//!
//! - `api`: the `RemoteStore` port, the HTTP client and an in-memory store
//! - `cache`: `RecordCache`
//! - `session`: `EditSession`
//! - `sync`: `SyncController` and request outcomes
//! - `view`: pagination over the records
//! - `config`: settings file and environment overrides

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod session;
pub mod sync;
pub mod view;

pub use api::{ApiClient, ApiError, InMemoryStore, RemoteStore};
pub use cache::{CacheError, RecordCache};
pub use config::Config;
pub use models::{Draft, Field, FieldPatch, Record, RecordKey, RemoteUser, UserFields, ValidationError};
pub use session::{EditSession, SessionError};
pub use sync::{RequestId, RollbackPolicy, SyncController, SyncError, SyncOp, SyncOutcome, SyncReport};
pub use view::{Pager, TableView};
