//! Purchase request aggregate root.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reqflow_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Entity, Money, UserId};

use crate::events::{
    PurchaseRequestApproved, PurchaseRequestCancelled, PurchaseRequestEvent,
    PurchaseRequestRejected, PurchaseRequestSubmitted,
};
use crate::flow::ApprovalFlow;
use crate::status::{PurchaseRequestStatus, can_transition};
use crate::step::ApprovalStep;

/// Ceiling on a request's total amount, in currency units.
pub const MAX_TOTAL_UNITS: u64 = 1_000_000;

/// Purchase request identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseRequestId(pub AggregateId);

impl PurchaseRequestId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseRequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Line item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub AggregateId);

impl ItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog product identifier. The catalog itself lives outside this crate;
/// items carry the id plus a denormalized display name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Human-readable request number, derived from the request id at creation.
///
/// The v7 id is time-ordered, so numbers come out roughly chronological
/// without a sequence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestNumber(String);

impl RequestNumber {
    fn derive(id: PurchaseRequestId) -> Self {
        let hex = id.0.as_uuid().simple().to_string();
        Self(format!("PR-{}", hex[..8].to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RequestNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Purchase request line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequestItem {
    id: ItemId,
    product_id: ProductId,
    product_name: String,
    unit_price: Money,
    quantity: u32,
    line_amount: Money,
}

impl PurchaseRequestItem {
    fn new(
        id: ItemId,
        product_id: ProductId,
        product_name: String,
        unit_price: Money,
        quantity: u32,
    ) -> DomainResult<Self> {
        if unit_price.is_zero() {
            return Err(DomainError::validation("unit price must be positive"));
        }
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        let line_amount = unit_price.checked_mul_u32(quantity)?;
        Ok(Self {
            id,
            product_id,
            product_name,
            unit_price,
            quantity,
            line_amount,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price x quantity, computed once at construction.
    pub fn line_amount(&self) -> Money {
        self.line_amount
    }
}

impl Entity for PurchaseRequestItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Aggregate root: PurchaseRequest.
///
/// Owns its line items and approval steps (composition) and an append-only
/// list of pending domain events. Every status mutation is checked against
/// the transition table first; operations validate fully before mutating and
/// append their event last, so a failed operation leaves the aggregate
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    id: PurchaseRequestId,
    request_number: RequestNumber,
    requester_id: UserId,
    requester_name: String,
    title: String,
    description: String,
    status: PurchaseRequestStatus,
    items: Vec<PurchaseRequestItem>,
    steps: Vec<ApprovalStep>,
    total_amount: Money,
    created_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    version: u64,
    pending_events: Vec<PurchaseRequestEvent>,
}

impl PurchaseRequest {
    /// Create a new draft request for a requester.
    pub fn create(
        requester_id: UserId,
        requester_name: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }

        let id = PurchaseRequestId::new(AggregateId::new());
        Ok(Self {
            id,
            request_number: RequestNumber::derive(id),
            requester_id,
            requester_name: requester_name.into(),
            title,
            description: description.into(),
            status: PurchaseRequestStatus::Draft,
            items: Vec::new(),
            steps: Vec::new(),
            total_amount: Money::ZERO,
            created_at: occurred_at,
            submitted_at: None,
            approved_at: None,
            rejected_at: None,
            cancelled_at: None,
            version: 0,
            pending_events: Vec::new(),
        })
    }

    pub fn max_total_amount() -> Money {
        Money::from(MAX_TOTAL_UNITS)
    }

    pub fn id_typed(&self) -> PurchaseRequestId {
        self.id
    }

    pub fn request_number(&self) -> &RequestNumber {
        &self.request_number
    }

    pub fn requester_id(&self) -> UserId {
        self.requester_id
    }

    pub fn requester_name(&self) -> &str {
        &self.requester_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> PurchaseRequestStatus {
        self.status
    }

    pub fn items(&self) -> &[PurchaseRequestItem] {
        &self.items
    }

    pub fn steps(&self) -> &[ApprovalStep] {
        &self.steps
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// The current step: the lowest-numbered step still pending, if any.
    ///
    /// Steps are decided strictly in order, so every step before the
    /// current one is approved and nothing after it has been processed.
    pub fn pending_step(&self) -> Option<&ApprovalStep> {
        self.pending_step_index().map(|idx| &self.steps[idx])
    }

    /// Events collected since the last drain, in emission order.
    pub fn pending_events(&self) -> &[PurchaseRequestEvent] {
        &self.pending_events
    }

    /// Hand the collected events to the caller and clear the list.
    ///
    /// Called after a successful save; the caller dispatches the returned
    /// records to the event sink.
    pub fn drain_events(&mut self) -> Vec<PurchaseRequestEvent> {
        core::mem::take(&mut self.pending_events)
    }

    /// Assigned by the persistence layer on save; never touched by domain
    /// operations.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Append a line item. Draft only; the resulting total must stay within
    /// [`MAX_TOTAL_UNITS`], otherwise nothing is appended.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> DomainResult<ItemId> {
        self.ensure_draft("add line items")?;

        let item = PurchaseRequestItem::new(
            ItemId::new(AggregateId::new()),
            product_id,
            product_name.into(),
            unit_price,
            quantity,
        )?;

        let new_total = self.total_amount.checked_add(item.line_amount())?;
        if new_total > Self::max_total_amount() {
            return Err(DomainError::business_rule(format!(
                "total amount must not exceed {}",
                Self::max_total_amount()
            )));
        }

        let item_id = item.id_typed();
        self.items.push(item);
        self.total_amount = new_total;
        Ok(item_id)
    }

    /// Remove a line item. Draft only.
    pub fn remove_item(&mut self, item_id: ItemId) -> DomainResult<()> {
        self.ensure_draft("remove line items")?;

        let idx = self
            .items
            .iter()
            .position(|item| item.id_typed() == item_id)
            .ok_or_else(DomainError::not_found)?;

        self.items.remove(idx);
        self.total_amount = Self::sum_line_amounts(&self.items)?;
        Ok(())
    }

    /// Submit the request for approval, materializing one pending step per
    /// flow step in flow order.
    pub fn submit(&mut self, flow: &ApprovalFlow, occurred_at: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_transition(PurchaseRequestStatus::Submitted)?;
        if self.items.is_empty() {
            return Err(DomainError::EmptyRequest);
        }

        self.steps = flow.steps().iter().map(ApprovalStep::from_flow_step).collect();
        self.status = PurchaseRequestStatus::Submitted;
        self.submitted_at = Some(occurred_at);
        self.pending_events
            .push(PurchaseRequestEvent::PurchaseRequestSubmitted(
                PurchaseRequestSubmitted {
                    request_id: self.id,
                    request_number: self.request_number.clone(),
                    requester_id: self.requester_id,
                    requester_name: self.requester_name.clone(),
                    total_amount: self.total_amount,
                    occurred_at,
                },
            ));
        Ok(())
    }

    /// Approve the current step. Advances to the next step's pending status,
    /// or to `Approved` when the approved step was the last one.
    pub fn approve(
        &mut self,
        approver_id: UserId,
        comment: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let step_idx = self.pending_step_index().ok_or(DomainError::NotFound)?;
        if self.steps[step_idx].approver_id() != approver_id {
            return Err(DomainError::Unauthorized);
        }

        // A decision on step N is processed in that step's pending status;
        // a freshly submitted request enters first approval here.
        let effective = self.effective_decision_status()?;

        let next_status = match self.steps.get(step_idx + 1) {
            Some(next) => PurchaseRequestStatus::pending_for_step(next.step_number())
                .ok_or_else(|| {
                    DomainError::invalid_state(format!(
                        "no pending status for step {}",
                        next.step_number()
                    ))
                })?,
            None => PurchaseRequestStatus::Approved,
        };
        // Steps beyond the third share the final pending status; a decision
        // that leaves the status in place is not a transition.
        if next_status != effective && !can_transition(effective, next_status) {
            return Err(DomainError::invalid_transition(
                effective.to_string(),
                next_status.to_string(),
            ));
        }

        self.steps[step_idx].approve(comment, occurred_at)?;
        self.status = next_status;
        if next_status == PurchaseRequestStatus::Approved {
            self.approved_at = Some(occurred_at);
            self.pending_events
                .push(PurchaseRequestEvent::PurchaseRequestApproved(
                    PurchaseRequestApproved {
                        request_id: self.id,
                        request_number: self.request_number.clone(),
                        requester_id: self.requester_id,
                        approver_id,
                        total_amount: self.total_amount,
                        occurred_at,
                    },
                ));
        }
        Ok(())
    }

    /// Reject the current step, moving the request to `Rejected`.
    pub fn reject(
        &mut self,
        approver_id: UserId,
        reason: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let step_idx = self.pending_step_index().ok_or(DomainError::NotFound)?;
        if self.steps[step_idx].approver_id() != approver_id {
            return Err(DomainError::Unauthorized);
        }
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(DomainError::validation("a rejection reason is required"));
        }

        let effective = self.effective_decision_status()?;
        if !can_transition(effective, PurchaseRequestStatus::Rejected) {
            return Err(DomainError::invalid_transition(
                effective.to_string(),
                PurchaseRequestStatus::Rejected.to_string(),
            ));
        }

        self.steps[step_idx].reject(reason.clone(), occurred_at)?;
        self.status = PurchaseRequestStatus::Rejected;
        self.rejected_at = Some(occurred_at);
        self.pending_events
            .push(PurchaseRequestEvent::PurchaseRequestRejected(
                PurchaseRequestRejected {
                    request_id: self.id,
                    request_number: self.request_number.clone(),
                    requester_id: self.requester_id,
                    approver_id,
                    reason,
                    occurred_at,
                },
            ));
        Ok(())
    }

    /// Cancel the request. Requester only; legal from `Submitted` and any
    /// pending status. Drafts are deleted through the persistence layer,
    /// not cancelled.
    pub fn cancel(&mut self, user_id: UserId, occurred_at: DateTime<Utc>) -> DomainResult<()> {
        if user_id != self.requester_id {
            return Err(DomainError::Unauthorized);
        }
        self.ensure_transition(PurchaseRequestStatus::Cancelled)?;

        self.status = PurchaseRequestStatus::Cancelled;
        self.cancelled_at = Some(occurred_at);
        self.pending_events
            .push(PurchaseRequestEvent::PurchaseRequestCancelled(
                PurchaseRequestCancelled {
                    request_id: self.id,
                    request_number: self.request_number.clone(),
                    requester_id: self.requester_id,
                    occurred_at,
                },
            ));
        Ok(())
    }

    fn pending_step_index(&self) -> Option<usize> {
        self.steps.iter().position(|step| step.is_pending())
    }

    /// The status an approval decision is evaluated against. `Submitted`
    /// normalizes to `PendingFirstApproval` (the only transition out of
    /// `Submitted` besides cancellation).
    fn effective_decision_status(&self) -> DomainResult<PurchaseRequestStatus> {
        if self.status == PurchaseRequestStatus::Submitted {
            self.ensure_transition(PurchaseRequestStatus::PendingFirstApproval)?;
            return Ok(PurchaseRequestStatus::PendingFirstApproval);
        }
        Ok(self.status)
    }

    fn ensure_transition(&self, to: PurchaseRequestStatus) -> DomainResult<()> {
        if !can_transition(self.status, to) {
            return Err(DomainError::invalid_transition(
                self.status.to_string(),
                to.to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_draft(&self, action: &str) -> DomainResult<()> {
        if self.status != PurchaseRequestStatus::Draft {
            return Err(DomainError::invalid_state(format!(
                "can only {action} while the request is a draft"
            )));
        }
        Ok(())
    }

    fn sum_line_amounts(items: &[PurchaseRequestItem]) -> DomainResult<Money> {
        items
            .iter()
            .try_fold(Money::ZERO, |acc, item| acc.checked_add(item.line_amount()))
    }
}

impl AggregateRoot for PurchaseRequest {
    type Id = PurchaseRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
