//! Single-row edit session.
//!
//! At most one record is open for editing at a time. The session keeps a
//! textual draft of the record's editable fields until it is saved or cancelled.

pub mod edit;

pub use edit::{EditSession, SessionError};
