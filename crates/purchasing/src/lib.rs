//! Purchasing domain module (purchase requests with multi-step approval).
//!
//! This crate contains the approval workflow engine for purchase requests,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage). A request moves from draft through an ordered sequence of
//! approval steps to a terminal outcome; every status change is checked
//! against an explicit transition table.

pub mod events;
pub mod flow;
pub mod request;
pub mod status;
pub mod step;

pub use events::{
    PurchaseRequestApproved, PurchaseRequestCancelled, PurchaseRequestEvent,
    PurchaseRequestRejected, PurchaseRequestSubmitted,
};
pub use flow::{ApprovalFlow, ApprovalFlowResolver, FlowStep, MAX_FLOW_STEPS};
pub use request::{
    ItemId, ProductId, PurchaseRequest, PurchaseRequestId, PurchaseRequestItem, RequestNumber,
};
pub use status::{PurchaseRequestStatus, can_transition};
pub use step::{ApprovalStep, ApprovalStepStatus};
