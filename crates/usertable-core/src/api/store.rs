use async_trait::async_trait;

use super::ApiError;
use crate::models::{DeleteResponse, FieldPatch, RemoteUser};

/// Remote side of the user collection.
///
/// The sync controller only ever talks to the store through this trait,
/// from background tasks, so implementations must be shareable across threads.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every user, in display order.
    async fn fetch_all(&self) -> Result<Vec<RemoteUser>, ApiError>;

    /// Apply `patch` to the user and return the store's canonical copy.
    async fn update(&self, remote_id: i64, patch: &FieldPatch) -> Result<RemoteUser, ApiError>;

    /// Delete the user. `success: false` means the store declined.
    async fn delete(&self, remote_id: i64) -> Result<DeleteResponse, ApiError>;
}
