//! Approval step: one stage of a request's sign-off sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reqflow_core::{DomainError, DomainResult, Entity, UserId};

use crate::flow::FlowStep;

/// Approval step status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStepStatus {
    Pending,
    Approved,
    Rejected,
}

/// One stage in a request's approval sequence, owned by the aggregate.
///
/// Steps are materialized from the resolved flow at submission time and are
/// never added or removed afterwards; only their status changes. Identity
/// fields (step number, approver) are immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalStep {
    step_number: u32,
    approver_id: UserId,
    approver_name: String,
    approver_role: String,
    status: ApprovalStepStatus,
    comment: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
}

impl ApprovalStep {
    pub(crate) fn from_flow_step(def: &FlowStep) -> Self {
        Self {
            step_number: def.step_number,
            approver_id: def.approver_id,
            approver_name: def.approver_name.clone(),
            approver_role: def.approver_role.clone(),
            status: ApprovalStepStatus::Pending,
            comment: None,
            approved_at: None,
            rejected_at: None,
        }
    }

    pub fn step_number(&self) -> u32 {
        self.step_number
    }

    pub fn approver_id(&self) -> UserId {
        self.approver_id
    }

    pub fn approver_name(&self) -> &str {
        &self.approver_name
    }

    pub fn approver_role(&self) -> &str {
        &self.approver_role
    }

    pub fn status(&self) -> ApprovalStepStatus {
        self.status
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStepStatus::Pending
    }

    fn ensure_unprocessed(&self) -> DomainResult<()> {
        if self.status != ApprovalStepStatus::Pending {
            return Err(DomainError::business_rule(format!(
                "approval step {} has already been processed",
                self.step_number
            )));
        }
        Ok(())
    }

    pub(crate) fn approve(
        &mut self,
        comment: Option<String>,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_unprocessed()?;
        self.status = ApprovalStepStatus::Approved;
        self.comment = comment;
        self.approved_at = Some(occurred_at);
        Ok(())
    }

    pub(crate) fn reject(
        &mut self,
        reason: String,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_unprocessed()?;
        self.status = ApprovalStepStatus::Rejected;
        self.comment = Some(reason);
        self.rejected_at = Some(occurred_at);
        Ok(())
    }
}

impl Entity for ApprovalStep {
    type Id = u32;

    fn id(&self) -> &Self::Id {
        &self.step_number
    }
}
