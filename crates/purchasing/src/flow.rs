//! Approval flow definition: the ordered list of required approvers.

use serde::{Deserialize, Serialize};

use reqflow_core::{DomainError, DomainResult, Money, UserId, ValueObject};

/// Upper bound on the number of steps a flow may carry.
pub const MAX_FLOW_STEPS: usize = 5;

/// One stage of an approval flow: who signs off at which position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    pub step_number: u32,
    pub approver_id: UserId,
    pub approver_name: String,
    pub approver_role: String,
}

/// Ordered list of 1..=[`MAX_FLOW_STEPS`] flow steps, numbered contiguously
/// starting at 1.
///
/// A flow is resolved externally from a request's total amount and consumed
/// once at submission time, when the aggregate materializes its approval
/// steps from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalFlow {
    steps: Vec<FlowStep>,
}

impl ApprovalFlow {
    pub fn new(steps: Vec<FlowStep>) -> DomainResult<Self> {
        if steps.is_empty() {
            return Err(DomainError::validation(
                "an approval flow requires at least one step",
            ));
        }
        if steps.len() > MAX_FLOW_STEPS {
            return Err(DomainError::validation(format!(
                "an approval flow carries at most {MAX_FLOW_STEPS} steps"
            )));
        }
        for (idx, step) in steps.iter().enumerate() {
            if step.step_number != (idx as u32) + 1 {
                return Err(DomainError::validation(
                    "approval flow steps must be numbered contiguously starting at 1",
                ));
            }
        }
        Ok(Self { steps })
    }

    /// Convenience constructor for a single-approver flow.
    pub fn single(
        approver_id: UserId,
        approver_name: impl Into<String>,
        approver_role: impl Into<String>,
    ) -> Self {
        Self {
            steps: vec![FlowStep {
                step_number: 1,
                approver_id,
                approver_name: approver_name.into(),
                approver_role: approver_role.into(),
            }],
        }
    }

    pub fn steps(&self) -> &[FlowStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl ValueObject for ApprovalFlow {}

/// Resolves the approval flow required for a given request total.
///
/// The mapping from amount thresholds to approver chains is a business
/// policy external to the workflow engine; implementations must be
/// deterministic for a given total.
pub trait ApprovalFlowResolver {
    fn resolve(&self, total_amount: Money) -> DomainResult<ApprovalFlow>;
}
