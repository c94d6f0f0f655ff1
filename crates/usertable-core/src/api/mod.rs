//! Remote store access.
//!
//! `RemoteStore` is the port the sync controller issues requests through.
//! `ApiClient` implements it over HTTP; `InMemoryStore` implements it in
//! process for tests and the demo front end.

pub mod client;
pub mod error;
pub mod in_memory;
pub mod store;

pub use client::ApiClient;
pub use error::ApiError;
pub use in_memory::InMemoryStore;
pub use store::RemoteStore;
