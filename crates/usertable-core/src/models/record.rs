use std::fmt;

use serde::{Deserialize, Serialize};

use super::user::{RemoteUser, UserFields};

/// Client-local record identifier.
///
/// Allocated by the record cache and never reused within a process,
/// independent of the id the remote store assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey(pub u64);

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the user table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub remote_id: i64,
    pub fields: UserFields,
}

impl Record {
    pub fn from_remote(key: RecordKey, user: &RemoteUser) -> Self {
        Self {
            key,
            remote_id: user.id,
            fields: user.fields(),
        }
    }
}
