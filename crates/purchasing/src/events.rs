//! Domain events emitted by the purchase request aggregate.
//!
//! Each successful externally-meaningful operation appends exactly one of
//! these records to the aggregate's pending-event list; the caller drains
//! and dispatches them after a successful save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reqflow_core::{Money, UserId};
use reqflow_events::Event;

use crate::request::{PurchaseRequestId, RequestNumber};

/// Event: PurchaseRequestSubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestSubmitted {
    pub request_id: PurchaseRequestId,
    pub request_number: RequestNumber,
    pub requester_id: UserId,
    pub requester_name: String,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseRequestApproved (final step approved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestApproved {
    pub request_id: PurchaseRequestId,
    pub request_number: RequestNumber,
    pub requester_id: UserId,
    pub approver_id: UserId,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseRequestRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestRejected {
    pub request_id: PurchaseRequestId,
    pub request_number: RequestNumber,
    pub requester_id: UserId,
    pub approver_id: UserId,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseRequestCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestCancelled {
    pub request_id: PurchaseRequestId,
    pub request_number: RequestNumber,
    pub requester_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseRequestEvent {
    PurchaseRequestSubmitted(PurchaseRequestSubmitted),
    PurchaseRequestApproved(PurchaseRequestApproved),
    PurchaseRequestRejected(PurchaseRequestRejected),
    PurchaseRequestCancelled(PurchaseRequestCancelled),
}

impl PurchaseRequestEvent {
    pub fn request_id(&self) -> PurchaseRequestId {
        match self {
            PurchaseRequestEvent::PurchaseRequestSubmitted(e) => e.request_id,
            PurchaseRequestEvent::PurchaseRequestApproved(e) => e.request_id,
            PurchaseRequestEvent::PurchaseRequestRejected(e) => e.request_id,
            PurchaseRequestEvent::PurchaseRequestCancelled(e) => e.request_id,
        }
    }
}

impl Event for PurchaseRequestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseRequestEvent::PurchaseRequestSubmitted(_) => "purchasing.request.submitted",
            PurchaseRequestEvent::PurchaseRequestApproved(_) => "purchasing.request.approved",
            PurchaseRequestEvent::PurchaseRequestRejected(_) => "purchasing.request.rejected",
            PurchaseRequestEvent::PurchaseRequestCancelled(_) => "purchasing.request.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseRequestEvent::PurchaseRequestSubmitted(e) => e.occurred_at,
            PurchaseRequestEvent::PurchaseRequestApproved(e) => e.occurred_at,
            PurchaseRequestEvent::PurchaseRequestRejected(e) => e.occurred_at,
            PurchaseRequestEvent::PurchaseRequestCancelled(e) => e.occurred_at,
        }
    }
}
