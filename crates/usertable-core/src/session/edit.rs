use thiserror::Error;
use tracing::debug;

use crate::models::{Draft, Field, Record, RecordKey, ValidationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Record {0} is already being edited")]
    AlreadyEditing(RecordKey),

    #[error("No active edit session")]
    NoActiveSession,

    #[error("Record {requested} is not being edited (editing {active})")]
    NotEditing {
        requested: RecordKey,
        active: RecordKey,
    },

    #[error("Record {0} is being edited")]
    RecordBeingEdited(RecordKey),

    #[error(transparent)]
    Field(#[from] ValidationError),
}

/// Single-row edit state: which record is open and its working copy.
#[derive(Debug, Default)]
pub struct EditSession {
    active: Option<(RecordKey, Draft)>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open `record` for editing. Only one record may be open at a time.
    pub fn begin(&mut self, record: &Record) -> Result<(), SessionError> {
        if let Some((active, _)) = &self.active {
            return Err(SessionError::AlreadyEditing(*active));
        }
        debug!(key = %record.key, "Edit session started");
        self.active = Some((record.key, Draft::from_fields(&record.fields)));
        Ok(())
    }

    pub fn update_draft_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), SessionError> {
        let (_, draft) = self.active.as_mut().ok_or(SessionError::NoActiveSession)?;
        draft.set(field, value)?;
        Ok(())
    }

    /// Close the session, discarding the draft. Returns the key that was open.
    pub fn cancel(&mut self) -> Option<RecordKey> {
        self.active.take().map(|(key, _)| key)
    }

    pub fn current(&self) -> Option<(RecordKey, &Draft)> {
        self.active.as_ref().map(|(key, draft)| (*key, draft))
    }

    pub fn active_key(&self) -> Option<RecordKey> {
        self.active.as_ref().map(|(key, _)| *key)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_editing(&self, key: RecordKey) -> bool {
        self.active_key() == Some(key)
    }

    /// Check that `key` is the open record.
    pub fn ensure_editing(&self, key: RecordKey) -> Result<(), SessionError> {
        match self.active_key() {
            Some(active) if active == key => Ok(()),
            Some(active) => Err(SessionError::NotEditing { requested: key, active }),
            None => Err(SessionError::NoActiveSession),
        }
    }
}
