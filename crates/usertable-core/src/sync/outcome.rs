use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiError;
use crate::cache::CacheError;
use crate::models::{RecordKey, UserFields, ValidationError};
use crate::session::SessionError;

/// Identifies one request issued to the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to do with an optimistic save the store rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// Log the failure and keep the edited values in the cache
    #[default]
    KeepOptimistic,
    /// Put the record's pre-edit values back
    RestoreSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Save,
    Delete,
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOp::Save => write!(f, "save"),
            SyncOp::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The store accepted the request. For a save these are the reconciled
    /// fields now in the cache; for a delete, the fields of the removed record.
    Committed(UserFields),
    Failed(String),
}

impl SyncOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, SyncOutcome::Committed(_))
    }
}

/// Resolution of one store request, handed back to the front end for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub request: RequestId,
    pub key: RecordKey,
    pub op: SyncOp,
    pub outcome: SyncOutcome,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Session(SessionError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("A delete is already pending for record {0}")]
    DeletePending(RecordKey),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<SessionError> for SyncError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Field(v) => SyncError::Validation(v),
            other => SyncError::Session(other),
        }
    }
}
