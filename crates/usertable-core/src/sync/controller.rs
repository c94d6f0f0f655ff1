//! Edit and delete orchestration against the remote store.
//!
//! The controller owns the record cache and the edit session. Every cache or
//! session mutation happens on the controller's owner; store requests run in
//! spawned tasks and report back through an MPSC channel, and their results are
//! applied only when the owner drains the channel.
//!
//! Saves are optimistic: the validated draft lands in the cache before the
//! store is asked. Deletes are pessimistic: the record stays visible until the
//! store answers `success: true`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::outcome::{RequestId, RollbackPolicy, SyncError, SyncOp, SyncOutcome, SyncReport};
use crate::api::{ApiError, RemoteStore};
use crate::cache::{CacheError, RecordCache};
use crate::models::{DeleteResponse, Draft, Field, FieldPatch, Record, RecordKey, RemoteUser, UserFields};
use crate::session::{EditSession, SessionError};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the completion channel.
/// Single-row editing keeps at most a handful of requests in flight.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Store responses sent back from request tasks
enum Completion {
    Updated(RequestId, Result<RemoteUser, ApiError>),
    Deleted(RequestId, Result<DeleteResponse, ApiError>),
    /// The request task ended without a response (panic or cancellation)
    Aborted(RequestId, String),
}

/// Bookkeeping for a request that has not been answered yet
enum PendingRequest {
    Save { key: RecordKey },
    Delete { key: RecordKey },
}

pub struct SyncController {
    store: Arc<dyn RemoteStore>,
    cache: RecordCache,
    session: EditSession,
    policy: RollbackPolicy,

    pending: HashMap<RequestId, PendingRequest>,
    /// Last fields the store is known to hold, for records with saves in flight
    baseline: HashMap<RecordKey, UserFields>,
    next_request: u64,

    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,
}

impl SyncController {
    pub fn new(store: Arc<dyn RemoteStore>, policy: RollbackPolicy) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            store,
            cache: RecordCache::new(),
            session: EditSession::new(),
            policy,
            pending: HashMap::new(),
            baseline: HashMap::new(),
            next_request: 0,
            completion_tx: tx,
            completion_rx: rx,
        }
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    // =========================================================================
    // Loading and reading
    // =========================================================================

    /// Fill the cache from the store's user list.
    ///
    /// Replaces any previous content, so an open edit is cancelled first.
    pub async fn load_from_remote(&mut self) -> Result<usize, SyncError> {
        let users = self.store.fetch_all().await.map_err(|e| {
            error!(error = %e, "Failed to fetch users");
            e
        })?;

        if let Some(key) = self.session.cancel() {
            info!(key = %key, "Reload cancelled the open edit");
        }
        self.cache.ingest(users);
        info!(count = self.cache.len(), "Users loaded from store");
        Ok(self.cache.len())
    }

    /// Records in collection order, for display
    pub fn list_records(&self) -> &[Record] {
        self.cache.snapshot()
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// The open record and its draft, if any
    pub fn current_edit(&self) -> Option<(RecordKey, &Draft)> {
        self.session.current()
    }

    /// Number of store requests not yet applied
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, key: RecordKey) -> bool {
        self.pending.values().any(|p| p.key() == key)
    }

    fn delete_pending(&self, key: RecordKey) -> bool {
        self.pending
            .values()
            .any(|p| matches!(p, PendingRequest::Delete { key: k } if *k == key))
    }

    fn save_pending(&self, key: RecordKey) -> bool {
        self.pending
            .values()
            .any(|p| matches!(p, PendingRequest::Save { key: k } if *k == key))
    }

    // =========================================================================
    // Edit session
    // =========================================================================

    pub fn begin_edit(&mut self, key: RecordKey) -> Result<(), SyncError> {
        let record = self.cache.get(key).ok_or(CacheError::NotFound(key))?;
        self.session.begin(record)?;
        Ok(())
    }

    /// Change one field of the open draft. `field` must name a recognized column.
    pub fn update_draft(&mut self, key: RecordKey, field: &str, value: &str) -> Result<(), SyncError> {
        self.session.ensure_editing(key)?;
        let field: Field = field.parse()?;
        self.session.update_draft_field(field, value)?;
        Ok(())
    }

    /// Discard the open draft. Requests already issued are not affected.
    pub fn cancel_edit(&mut self) -> Option<RecordKey> {
        let cancelled = self.session.cancel();
        if let Some(key) = cancelled {
            debug!(key = %key, "Edit cancelled");
        }
        cancelled
    }

    /// Hook for any change of the visible window (page, page size, sort).
    ///
    /// Always ends the open edit, whichever record it is on.
    pub fn on_navigate(&mut self) {
        if let Some(key) = self.session.cancel() {
            info!(key = %key, "Navigation cancelled the open edit");
        }
    }

    // =========================================================================
    // Save and delete
    // =========================================================================

    /// Validate the draft, commit it to the cache and send it to the store.
    ///
    /// On a validation error nothing changes: the session stays open with the
    /// same draft and no request is issued. Must be called inside a Tokio runtime.
    pub fn save_edit(&mut self, key: RecordKey) -> Result<RequestId, SyncError> {
        self.session.ensure_editing(key)?;

        let fields = match self.session.current().map(|(_, draft)| draft.validate()) {
            Some(Ok(fields)) => fields,
            Some(Err(e)) => {
                warn!(key = %key, error = %e, "Validate failed");
                return Err(e.into());
            }
            None => return Err(SessionError::NoActiveSession.into()),
        };

        let Some(record) = self.cache.get(key) else {
            error!(key = %key, "Edited record missing from cache");
            self.session.cancel();
            return Err(CacheError::NotFound(key).into());
        };
        let remote_id = record.remote_id;
        self.baseline
            .entry(key)
            .or_insert_with(|| record.fields.clone());

        let patch = FieldPatch::from(fields);
        self.cache.replace_one(key, patch.clone())?;
        self.session.cancel();

        let request = self.next_request_id();
        self.pending.insert(request, PendingRequest::Save { key });

        info!(key = %key, remote_id, request = %request, "Save committed locally, updating store");
        self.spawn_update(request, remote_id, patch);
        Ok(request)
    }

    /// Ask the store to delete a record. The cache changes only on success.
    /// Must be called inside a Tokio runtime.
    pub fn delete_record(&mut self, key: RecordKey) -> Result<RequestId, SyncError> {
        if self.session.is_editing(key) {
            return Err(SessionError::RecordBeingEdited(key).into());
        }
        let remote_id = self
            .cache
            .get(key)
            .ok_or(CacheError::NotFound(key))?
            .remote_id;
        if self.delete_pending(key) {
            return Err(SyncError::DeletePending(key));
        }

        let request = self.next_request_id();
        self.pending.insert(request, PendingRequest::Delete { key });

        info!(key = %key, remote_id, request = %request, "Deleting record from store");
        self.spawn_delete(request, remote_id);
        Ok(request)
    }

    fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    fn spawn_update(&self, request: RequestId, remote_id: i64, patch: FieldPatch) {
        let store = Arc::clone(&self.store);
        self.spawn_request(
            request,
            async move { store.update(remote_id, &patch).await },
            Completion::Updated,
        );
    }

    fn spawn_delete(&self, request: RequestId, remote_id: i64) {
        let store = Arc::clone(&self.store);
        self.spawn_request(
            request,
            async move { store.delete(remote_id).await },
            Completion::Deleted,
        );
    }

    /// Run a store call in its own task so that a panic still produces a
    /// completion and the request does not stay pending forever.
    fn spawn_request<T, F>(
        &self,
        request: RequestId,
        call: F,
        completion: fn(RequestId, Result<T, ApiError>) -> Completion,
    ) where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let completion = match tokio::spawn(call).await {
                Ok(result) => completion(request, result),
                Err(e) => {
                    error!(request = %request, error = %e, "Store request task failed");
                    Completion::Aborted(request, e.to_string())
                }
            };
            Self::send_completion(&tx, completion).await;
        });
    }

    /// Helper to send completions, logging any channel errors
    async fn send_completion(tx: &mpsc::Sender<Completion>, completion: Completion) {
        if let Err(e) = tx.send(completion).await {
            error!(error = %e, "Failed to send store completion - channel closed");
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Apply every store response that has arrived, without waiting.
    pub fn process_completions(&mut self) -> Vec<SyncReport> {
        let mut completions = Vec::new();
        while let Ok(completion) = self.completion_rx.try_recv() {
            completions.push(completion);
        }

        completions
            .into_iter()
            .filter_map(|c| self.apply(c))
            .collect()
    }

    /// Wait for the next store response and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_report(&mut self) -> Option<SyncReport> {
        while !self.pending.is_empty() {
            let completion = self.completion_rx.recv().await?;
            if let Some(report) = self.apply(completion) {
                return Some(report);
            }
        }
        None
    }

    /// Wait until every issued request has been answered and applied.
    pub async fn settle(&mut self) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        while let Some(report) = self.next_report().await {
            reports.push(report);
        }
        reports
    }

    fn apply(&mut self, completion: Completion) -> Option<SyncReport> {
        match completion {
            Completion::Updated(request, result) => match self.pending.remove(&request) {
                Some(PendingRequest::Save { key }) => Some(self.reconcile_save(request, key, result)),
                _ => {
                    warn!(request = %request, "Update response for unknown request");
                    None
                }
            },
            Completion::Deleted(request, result) => match self.pending.remove(&request) {
                Some(PendingRequest::Delete { key }) => Some(self.reconcile_delete(request, key, result)),
                _ => {
                    warn!(request = %request, "Delete response for unknown request");
                    None
                }
            },
            Completion::Aborted(request, reason) => {
                let Some(pending) = self.pending.remove(&request) else {
                    warn!(request = %request, "Failure for unknown request");
                    return None;
                };
                let (key, op) = match pending {
                    PendingRequest::Save { key } => {
                        self.handle_failed_save(key);
                        (key, SyncOp::Save)
                    }
                    PendingRequest::Delete { key } => (key, SyncOp::Delete),
                };
                Some(SyncReport {
                    request,
                    key,
                    op,
                    outcome: SyncOutcome::Failed(reason),
                })
            }
        }
    }

    fn reconcile_save(
        &mut self,
        request: RequestId,
        key: RecordKey,
        result: Result<RemoteUser, ApiError>,
    ) -> SyncReport {
        let outcome = match result {
            Ok(user) => {
                let canonical = user.fields();
                if self.save_pending(key) {
                    self.baseline.insert(key, canonical.clone());
                } else {
                    self.baseline.remove(&key);
                }

                match self.cache.replace_one(key, canonical.clone().into()) {
                    Ok(record) => {
                        debug!(key = %key, request = %request, "Save reconciled with store");
                        SyncOutcome::Committed(record.fields.clone())
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Record removed before update was acknowledged");
                        SyncOutcome::Committed(canonical)
                    }
                }
            }
            Err(e) => {
                error!(key = %key, request = %request, error = %e, "Failed to update user");
                self.handle_failed_save(key);
                SyncOutcome::Failed(e.to_string())
            }
        };

        SyncReport {
            request,
            key,
            op: SyncOp::Save,
            outcome,
        }
    }

    /// Apply the rollback policy once a save has failed.
    ///
    /// While other saves for the record are still out, the outcome of the last
    /// one to finish decides, so nothing is restored yet.
    fn handle_failed_save(&mut self, key: RecordKey) {
        if self.save_pending(key) {
            debug!(key = %key, "Newer save still pending, rollback deferred");
            return;
        }
        let Some(baseline) = self.baseline.remove(&key) else {
            return;
        };

        match self.policy {
            RollbackPolicy::KeepOptimistic => {
                warn!(key = %key, "Keeping unsaved values in the cache");
            }
            RollbackPolicy::RestoreSnapshot => match self.cache.replace_one(key, baseline.into()) {
                Ok(_) => info!(key = %key, "Restored last saved values"),
                Err(e) => warn!(key = %key, error = %e, "Nothing to restore"),
            },
        }
    }

    fn reconcile_delete(
        &mut self,
        request: RequestId,
        key: RecordKey,
        result: Result<DeleteResponse, ApiError>,
    ) -> SyncReport {
        let outcome = match result {
            Ok(DeleteResponse { success: true }) => match self.cache.remove_one(key) {
                Ok(record) => {
                    self.baseline.remove(&key);
                    if self.session.is_editing(key) {
                        self.session.cancel();
                        warn!(key = %key, "Deleted record was open for editing, edit cancelled");
                    }
                    info!(key = %key, request = %request, "Record deleted");
                    SyncOutcome::Committed(record.fields)
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Deleted record already gone from cache");
                    SyncOutcome::Failed(e.to_string())
                }
            },
            Ok(DeleteResponse { success: false }) => {
                warn!(key = %key, request = %request, "Store declined delete");
                SyncOutcome::Failed("Store declined the delete".to_string())
            }
            Err(e) => {
                error!(key = %key, request = %request, error = %e, "Failed to delete user");
                SyncOutcome::Failed(e.to_string())
            }
        };

        SyncReport {
            request,
            key,
            op: SyncOp::Delete,
            outcome,
        }
    }
}

impl PendingRequest {
    fn key(&self) -> RecordKey {
        match self {
            PendingRequest::Save { key, .. } | PendingRequest::Delete { key } => *key,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
