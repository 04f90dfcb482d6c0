//! Application-level orchestration of the approval workflow.
//!
//! `ApprovalService` implements the contract the workflow engine is written
//! against: load the aggregate, invoke exactly one domain operation, save
//! with the loaded revision as the optimistic expectation, then drain the
//! collected events and hand them to the sink wrapped in envelopes. On a
//! version conflict the intent must be replayed by the caller against a
//! fresh load; the service never retries on its own.

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use chrono::Utc;

use reqflow_core::{AggregateRoot, DomainError, ExpectedVersion, Money, UserId};
use reqflow_events::{EventEnvelope, EventSink};
use reqflow_purchasing::{
    ApprovalFlowResolver, ItemId, ProductId, PurchaseRequest, PurchaseRequestEvent,
    PurchaseRequestId, PurchaseRequestStatus,
};

use crate::store::{RequestStore, StoreError};

/// Stream type identifier used in dispatched envelopes.
pub const AGGREGATE_TYPE: &str = "purchasing.request";

/// Application-level error: domain outcomes plus infrastructure failures.
///
/// `VersionConflict` is kept distinct so callers can reload and replay the
/// intent; everything in `Domain` is a terminal answer for the attempted
/// operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("optimistic concurrency conflict: {0}")]
    VersionConflict(String),

    #[error("purchase request not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Store(String),

    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::VersionConflict(msg) => ServiceError::VersionConflict(msg),
            StoreError::Unavailable(msg) => ServiceError::Store(msg),
        }
    }
}

/// Orchestrates purchase request operations over a store, an event sink and
/// a flow resolver.
pub struct ApprovalService<S, K, R> {
    store: S,
    sink: K,
    resolver: R,
}

impl<S, K, R> ApprovalService<S, K, R>
where
    S: RequestStore,
    K: EventSink<EventEnvelope<PurchaseRequestEvent>>,
    R: ApprovalFlowResolver,
{
    pub fn new(store: S, sink: K, resolver: R) -> Self {
        Self {
            store,
            sink,
            resolver,
        }
    }

    /// Create a draft request and persist its initial snapshot.
    pub fn create_request(
        &self,
        requester_id: UserId,
        requester_name: &str,
        title: &str,
        description: &str,
    ) -> Result<PurchaseRequestId, ServiceError> {
        let request =
            PurchaseRequest::create(requester_id, requester_name, title, description, Utc::now())?;
        self.store.save(&request, ExpectedVersion::Exact(0))?;

        info!(
            request_id = %request.id_typed(),
            request_number = %request.request_number(),
            "purchase request created"
        );
        Ok(request.id_typed())
    }

    pub fn add_item(
        &self,
        request_id: PurchaseRequestId,
        product_id: ProductId,
        product_name: &str,
        unit_price: Money,
        quantity: u32,
    ) -> Result<ItemId, ServiceError> {
        let mut request = self.store.load(request_id)?;
        let item_id = request.add_item(product_id, product_name, unit_price, quantity)?;
        self.persist_and_dispatch(&mut request)?;
        Ok(item_id)
    }

    pub fn remove_item(
        &self,
        request_id: PurchaseRequestId,
        item_id: ItemId,
    ) -> Result<(), ServiceError> {
        let mut request = self.store.load(request_id)?;
        request.remove_item(item_id)?;
        self.persist_and_dispatch(&mut request)?;
        Ok(())
    }

    /// Submit the request, resolving its approval flow from the total.
    pub fn submit(&self, request_id: PurchaseRequestId) -> Result<(), ServiceError> {
        let mut request = self.store.load(request_id)?;
        let flow = self.resolver.resolve(request.total_amount())?;
        request.submit(&flow, Utc::now())?;
        self.persist_and_dispatch(&mut request)?;

        info!(
            request_id = %request_id,
            steps = flow.len(),
            total = %request.total_amount(),
            "purchase request submitted"
        );
        Ok(())
    }

    pub fn approve(
        &self,
        request_id: PurchaseRequestId,
        approver_id: UserId,
        comment: Option<String>,
    ) -> Result<(), ServiceError> {
        let mut request = self.store.load(request_id)?;
        request.approve(approver_id, comment, Utc::now())?;
        self.persist_and_dispatch(&mut request)?;

        info!(
            request_id = %request_id,
            status = %request.status(),
            "approval recorded"
        );
        Ok(())
    }

    pub fn reject(
        &self,
        request_id: PurchaseRequestId,
        approver_id: UserId,
        reason: &str,
    ) -> Result<(), ServiceError> {
        let mut request = self.store.load(request_id)?;
        request.reject(approver_id, reason, Utc::now())?;
        self.persist_and_dispatch(&mut request)?;

        info!(request_id = %request_id, "purchase request rejected");
        Ok(())
    }

    pub fn cancel(
        &self,
        request_id: PurchaseRequestId,
        user_id: UserId,
    ) -> Result<(), ServiceError> {
        let mut request = self.store.load(request_id)?;
        request.cancel(user_id, Utc::now())?;
        self.persist_and_dispatch(&mut request)?;

        info!(request_id = %request_id, "purchase request cancelled");
        Ok(())
    }

    /// Delete a draft. Drafts are removed outright instead of being
    /// cancelled; anything past Draft must go through `cancel`.
    pub fn delete_draft(
        &self,
        request_id: PurchaseRequestId,
        user_id: UserId,
    ) -> Result<(), ServiceError> {
        let request = self.store.load(request_id)?;
        if request.requester_id() != user_id {
            return Err(DomainError::Unauthorized.into());
        }
        if request.status() != PurchaseRequestStatus::Draft {
            return Err(
                DomainError::invalid_state("only draft requests can be deleted").into(),
            );
        }

        self.store.delete(request_id)?;
        info!(request_id = %request_id, "draft purchase request deleted");
        Ok(())
    }

    /// Read access to the current snapshot.
    pub fn get(&self, request_id: PurchaseRequestId) -> Result<PurchaseRequest, ServiceError> {
        Ok(self.store.load(request_id)?)
    }

    fn persist_and_dispatch(&self, request: &mut PurchaseRequest) -> Result<u64, ServiceError> {
        let expected = ExpectedVersion::Exact(request.version());
        let new_version = self.store.save(request, expected)?;
        request.set_version(new_version);

        for event in request.drain_events() {
            let envelope = EventEnvelope::new(
                Uuid::now_v7(),
                request.id_typed().0,
                AGGREGATE_TYPE,
                new_version,
                event,
            );
            self.sink
                .publish(envelope)
                .map_err(|e| ServiceError::Publish(format!("{e:?}")))?;
        }

        Ok(new_version)
    }
}
