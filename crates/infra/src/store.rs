//! Purchase request persistence contract and in-memory implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use reqflow_core::{AggregateRoot, ExpectedVersion};
use reqflow_purchasing::{PurchaseRequest, PurchaseRequestId};

/// Store operation error.
///
/// These are infrastructure failures (missing snapshot, stale revision) as
/// opposed to domain errors. On a version conflict the caller reloads the
/// aggregate and replays the intent; the store performs no retries itself.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("purchase request not found")]
    NotFound,

    #[error("optimistic concurrency conflict: {0}")]
    VersionConflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot store for purchase requests.
///
/// The store owns the revision counter: `save` checks the caller's
/// expectation against the stored revision and bumps it on success. Domain
/// operations never touch the counter.
pub trait RequestStore: Send + Sync {
    /// Load the current snapshot of an aggregate.
    fn load(&self, id: PurchaseRequestId) -> Result<PurchaseRequest, StoreError>;

    /// Persist a snapshot if the expectation matches the stored revision.
    /// Returns the new revision.
    fn save(
        &self,
        request: &PurchaseRequest,
        expected: ExpectedVersion,
    ) -> Result<u64, StoreError>;

    /// Remove an aggregate. Drafts are deleted, not cancelled.
    fn delete(&self, id: PurchaseRequestId) -> Result<(), StoreError>;
}

impl<S> RequestStore for std::sync::Arc<S>
where
    S: RequestStore + ?Sized,
{
    fn load(&self, id: PurchaseRequestId) -> Result<PurchaseRequest, StoreError> {
        (**self).load(id)
    }

    fn save(
        &self,
        request: &PurchaseRequest,
        expected: ExpectedVersion,
    ) -> Result<u64, StoreError> {
        (**self).save(request, expected)
    }

    fn delete(&self, id: PurchaseRequestId) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}

/// In-memory snapshot store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<PurchaseRequestId, PurchaseRequest>>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestStore for InMemoryRequestStore {
    fn load(&self, id: PurchaseRequestId) -> Result<PurchaseRequest, StoreError> {
        let map = self
            .requests
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        map.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn save(
        &self,
        request: &PurchaseRequest,
        expected: ExpectedVersion,
    ) -> Result<u64, StoreError> {
        let mut map = self
            .requests
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let id = request.id_typed();
        let current = map.get(&id).map(|stored| stored.version()).unwrap_or(0);
        if !expected.matches(current) {
            return Err(StoreError::VersionConflict(format!(
                "expected {expected:?}, found {current}"
            )));
        }

        let next = current + 1;
        let mut snapshot = request.clone();
        snapshot.set_version(next);
        // Pending events stay with the caller for dispatch; the persisted
        // snapshot carries none.
        snapshot.drain_events();
        map.insert(id, snapshot);

        Ok(next)
    }

    fn delete(&self, id: PurchaseRequestId) -> Result<(), StoreError> {
        let mut map = self
            .requests
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        map.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
