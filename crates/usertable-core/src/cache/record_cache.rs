use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{FieldPatch, Record, RecordKey, RemoteUser};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Record not found in cache: {0}")]
    NotFound(RecordKey),
}

/// In-memory ordered mirror of the remote user collection.
///
/// Every record carries a unique key; keys are handed out by `ingest` from a
/// counter that only moves forward, so a deleted key is never seen again.
#[derive(Debug, Default)]
pub struct RecordCache {
    records: Vec<Record>,
    next_key: u64,
    loaded_at: Option<DateTime<Utc>>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole cache content, preserving order.
    pub fn load(&mut self, records: Vec<Record>) {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if seen.insert(record.key) {
                self.next_key = self.next_key.max(record.key.0);
                kept.push(record);
            } else {
                warn!(key = %record.key, "Duplicate record key in load, keeping first");
            }
        }

        debug!(count = kept.len(), "Record cache loaded");
        self.records = kept;
        self.loaded_at = Some(Utc::now());
    }

    /// Assign fresh keys to users fetched from the store and load them.
    pub fn ingest(&mut self, users: Vec<RemoteUser>) {
        let records: Vec<Record> = users
            .iter()
            .map(|user| Record::from_remote(self.allocate_key(), user))
            .collect();
        self.load(records);
    }

    fn allocate_key(&mut self) -> RecordKey {
        self.next_key += 1;
        RecordKey(self.next_key)
    }

    /// Merge `patch` into the record's fields. Key and remote id never change.
    pub fn replace_one(&mut self, key: RecordKey, patch: FieldPatch) -> Result<&Record, CacheError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.key == key)
            .ok_or(CacheError::NotFound(key))?;
        record.fields.merge(patch);
        Ok(record)
    }

    pub fn remove_one(&mut self, key: RecordKey) -> Result<Record, CacheError> {
        let index = self
            .records
            .iter()
            .position(|r| r.key == key)
            .ok_or(CacheError::NotFound(key))?;
        Ok(self.records.remove(index))
    }

    pub fn get(&self, key: RecordKey) -> Option<&Record> {
        self.records.iter().find(|r| r.key == key)
    }

    pub fn contains(&self, key: RecordKey) -> bool {
        self.get(key).is_some()
    }

    /// Current records in collection order
    pub fn snapshot(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.loaded_at.map(|at| (Utc::now() - at).num_minutes())
    }

    /// Human readable time since the last load, or "never".
    pub fn age_display(&self) -> String {
        match self.age_minutes() {
            None => "never".to_string(),
            Some(minutes) if minutes < 1 => "just now".to_string(),
            Some(minutes) if minutes < 60 => format!("{}m ago", minutes),
            Some(minutes) if minutes < 1440 => {
                let hours = minutes / 60;
                if minutes % 60 >= 30 {
                    format!("{}h ago", hours + 1)
                } else {
                    format!("{}h ago", hours)
                }
            }
            Some(minutes) => {
                let days = minutes / 1440;
                if (minutes % 1440) / 60 >= 12 {
                    format!("{}d ago", days + 1)
                } else {
                    format!("{}d ago", days)
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserFields;
    use chrono::Duration;

    fn user(id: i64, name: &str) -> RemoteUser {
        RemoteUser {
            id,
            name: name.to_string(),
            age: 20,
            address: "X".to_string(),
        }
    }

    fn cache_with(names: &[&str]) -> RecordCache {
        let mut cache = RecordCache::new();
        cache.ingest(
            names
                .iter()
                .enumerate()
                .map(|(i, n)| user(i as i64 + 100, n))
                .collect(),
        );
        cache
    }

    #[test]
    fn test_ingest_assigns_sequential_keys_in_order() {
        let cache = cache_with(&["A", "B", "C"]);
        let keys: Vec<u64> = cache.snapshot().iter().map(|r| r.key.0).collect();
        assert_eq!(keys, vec![1, 2, 3]);
        assert_eq!(cache.snapshot()[1].remote_id, 101);
        assert_eq!(cache.snapshot()[1].fields.name, "B");
    }

    #[test]
    fn test_keys_not_reused_after_remove_and_reload() {
        let mut cache = cache_with(&["A", "B"]);
        cache.remove_one(RecordKey(2)).unwrap();
        cache.ingest(vec![user(7, "C")]);
        assert_eq!(cache.snapshot()[0].key, RecordKey(3));
    }

    #[test]
    fn test_load_replaces_content_and_drops_duplicates() {
        let mut cache = cache_with(&["A"]);
        let fields = UserFields {
            name: "Z".to_string(),
            age: 1,
            address: "Q".to_string(),
        };
        cache.load(vec![
            Record { key: RecordKey(10), remote_id: 1, fields: fields.clone() },
            Record { key: RecordKey(10), remote_id: 2, fields: fields.clone() },
            Record { key: RecordKey(4), remote_id: 3, fields },
        ]);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(RecordKey(10)).unwrap().remote_id, 1);

        // Allocation continues past the highest loaded key
        cache.ingest(vec![user(9, "N")]);
        assert_eq!(cache.snapshot()[0].key, RecordKey(11));
    }

    #[test]
    fn test_replace_one_merges_and_preserves_identity() {
        let mut cache = cache_with(&["A"]);
        let record = cache
            .replace_one(
                RecordKey(1),
                FieldPatch {
                    age: Some(21),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(record.key, RecordKey(1));
        assert_eq!(record.remote_id, 100);
        assert_eq!(record.fields.name, "A");
        assert_eq!(record.fields.age, 21);
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let mut cache = cache_with(&["A"]);
        assert_eq!(
            cache.replace_one(RecordKey(9), FieldPatch::default()).unwrap_err(),
            CacheError::NotFound(RecordKey(9))
        );
        assert_eq!(
            cache.remove_one(RecordKey(9)).unwrap_err(),
            CacheError::NotFound(RecordKey(9))
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_age_display() {
        let mut cache = RecordCache::new();
        assert_eq!(cache.age_display(), "never");

        cache.load(Vec::new());
        assert_eq!(cache.age_display(), "just now");

        cache.loaded_at = Some(Utc::now() - Duration::minutes(5));
        assert_eq!(cache.age_display(), "5m ago");

        cache.loaded_at = Some(Utc::now() - Duration::minutes(95));
        assert_eq!(cache.age_display(), "2h ago");

        cache.loaded_at = Some(Utc::now() - Duration::hours(26));
        assert_eq!(cache.age_display(), "1d ago");
    }
}
