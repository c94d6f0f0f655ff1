//! Data models for the user table.
//!
//! - `Record`, `RecordKey`: cached rows and their client-local keys
//! - `Field`, `Draft`, `ValidationError`: the recognized column schema and edit buffer
//! - `RemoteUser`, `FieldPatch` and the response wrappers: store wire types

pub mod record;
pub mod user;

pub use record::{Record, RecordKey};
pub use user::{
    DeleteResponse, Draft, Field, FieldPatch, RemoteUser, UserFields, UserResponse,
    UsersResponse, ValidationError,
};
