//! In memory user store.
//!
//! Stands in for the user service in tests and in the demo mode of the CLI.
//! Can be switched offline (every call fails) or made to decline deletes
//! (answers `success: false`), and records every update it accepts.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ApiError, RemoteStore};
use crate::models::{DeleteResponse, FieldPatch, RemoteUser};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<Vec<RemoteUser>>,
    updates: RwLock<Vec<(i64, FieldPatch)>>,
    deletes: RwLock<Vec<i64>>,
    offline: AtomicBool,
    decline_deletes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<RemoteUser>) -> Self {
        Self {
            users: RwLock::new(users),
            ..Self::default()
        }
    }

    /// A small fixed user list for trying the table out.
    pub fn seeded() -> Self {
        let users = [
            (1, "Edward King", 32, "London, Park Lane no. 1"),
            (2, "Jim Green", 42, "London, Park Lane no. 2"),
            (3, "Joe Black", 28, "Sidney, Park Lane no. 3"),
            (4, "Jim Red", 35, "London, Park Lane no. 4"),
            (5, "Mary White", 51, "New York, Park Lane no. 5"),
            (6, "Lucy Brown", 23, "Dublin, Park Lane no. 6"),
            (7, "Tom Grey", 44, "Sidney, Park Lane no. 7"),
            (8, "Anna Blue", 30, "London, Park Lane no. 8"),
            (9, "Paul Black", 38, "Paris, Park Lane no. 9"),
            (10, "Nina Gold", 27, "Berlin, Park Lane no. 10"),
            (11, "Omar Stone", 60, "Cairo, Park Lane no. 11"),
            (12, "Rita Lane", 33, "Rome, Park Lane no. 12"),
        ]
        .into_iter()
        .map(|(id, name, age, address)| RemoteUser {
            id,
            name: name.to_string(),
            age,
            address: address.to_string(),
        })
        .collect();
        Self::with_users(users)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_decline_deletes(&self, decline: bool) {
        self.decline_deletes.store(decline, Ordering::SeqCst);
    }

    pub async fn users(&self) -> Vec<RemoteUser> {
        self.users.read().await.clone()
    }

    /// Every update accepted so far, in arrival order
    pub async fn updates(&self) -> Vec<(i64, FieldPatch)> {
        self.updates.read().await.clone()
    }

    /// Every remote id a delete was requested for, accepted or not
    pub async fn deletes(&self) -> Vec<i64> {
        self.deletes.read().await.clone()
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::Unavailable("In memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn fetch_all(&self) -> Result<Vec<RemoteUser>, ApiError> {
        self.check_online()?;
        Ok(self.users.read().await.clone())
    }

    async fn update(&self, remote_id: i64, patch: &FieldPatch) -> Result<RemoteUser, ApiError> {
        self.check_online()?;

        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == remote_id)
            .ok_or_else(|| ApiError::NotFound(format!("user {}", remote_id)))?;

        let mut fields = user.fields();
        fields.merge(patch.clone());
        user.name = fields.name;
        user.age = fields.age;
        user.address = fields.address;

        self.updates.write().await.push((remote_id, patch.clone()));
        Ok(user.clone())
    }

    async fn delete(&self, remote_id: i64) -> Result<DeleteResponse, ApiError> {
        self.check_online()?;
        self.deletes.write().await.push(remote_id);

        if self.decline_deletes.load(Ordering::SeqCst) {
            return Ok(DeleteResponse { success: false });
        }

        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != remote_id);
        Ok(DeleteResponse {
            success: users.len() < before,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> RemoteUser {
        RemoteUser {
            id,
            name: "A".to_string(),
            age: 20,
            address: "X".to_string(),
        }
    }

    #[tokio::test]
    async fn test_update_merges_and_records() {
        let store = InMemoryStore::with_users(vec![user(1)]);
        let patch = FieldPatch {
            age: Some(21),
            ..Default::default()
        };
        let updated = store.update(1, &patch).await.unwrap();
        assert_eq!(updated.age, 21);
        assert_eq!(updated.name, "A");
        assert_eq!(store.updates().await, vec![(1, patch)]);
        assert_eq!(store.users().await[0].age, 21);
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let store = InMemoryStore::new();
        let result = store.update(5, &FieldPatch::default()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert!(store.updates().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_success_flag() {
        let store = InMemoryStore::with_users(vec![user(1), user(2)]);
        assert!(store.delete(1).await.unwrap().success);
        assert!(!store.delete(1).await.unwrap().success);

        store.set_decline_deletes(true);
        assert!(!store.delete(2).await.unwrap().success);
        assert_eq!(store.users().await.len(), 1);
        assert_eq!(store.deletes().await, vec![1, 1, 2]);
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = InMemoryStore::seeded();
        store.set_offline(true);
        let result = store.fetch_all().await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("In memory store offline"));
        assert!(store.delete(1).await.is_err());

        store.set_offline(false);
        assert_eq!(store.fetch_all().await.unwrap().len(), 12);
    }
}
