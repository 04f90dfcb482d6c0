//! Purchase request status lifecycle and its transition table.

use serde::{Deserialize, Serialize};

/// Purchase request status lifecycle.
///
/// `Approved`, `Rejected` and `Cancelled` are terminal: no transition leaves
/// them. A freshly submitted request sits in `Submitted` until the first
/// approver acts on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseRequestStatus {
    Draft,
    Submitted,
    PendingFirstApproval,
    PendingSecondApproval,
    PendingFinalApproval,
    Approved,
    Rejected,
    Cancelled,
}

/// All statuses, in lifecycle order. Useful for exhaustive checks in tests.
pub const ALL_STATUSES: [PurchaseRequestStatus; 8] = [
    PurchaseRequestStatus::Draft,
    PurchaseRequestStatus::Submitted,
    PurchaseRequestStatus::PendingFirstApproval,
    PurchaseRequestStatus::PendingSecondApproval,
    PurchaseRequestStatus::PendingFinalApproval,
    PurchaseRequestStatus::Approved,
    PurchaseRequestStatus::Rejected,
    PurchaseRequestStatus::Cancelled,
];

impl PurchaseRequestStatus {
    /// Statuses reachable from `self` in a single transition.
    ///
    /// This is the entire transition table; every status mutation on the
    /// aggregate goes through [`can_transition`] before taking effect.
    pub fn allowed_transitions(self) -> &'static [PurchaseRequestStatus] {
        use PurchaseRequestStatus::*;

        match self {
            Draft => &[Submitted],
            Submitted => &[PendingFirstApproval, Cancelled],
            PendingFirstApproval => &[
                PendingSecondApproval,
                PendingFinalApproval,
                Approved,
                Rejected,
                Cancelled,
            ],
            PendingSecondApproval => &[PendingFinalApproval, Approved, Rejected, Cancelled],
            PendingFinalApproval => &[Approved, Rejected, Cancelled],
            Approved | Rejected | Cancelled => &[],
        }
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// The pending status a request sits in while the given step number is
    /// the current step. Steps beyond the third share the final-approval
    /// status (flows carry at most [`crate::flow::MAX_FLOW_STEPS`] steps).
    pub fn pending_for_step(step_number: u32) -> Option<PurchaseRequestStatus> {
        match step_number {
            0 => None,
            1 => Some(PurchaseRequestStatus::PendingFirstApproval),
            2 => Some(PurchaseRequestStatus::PendingSecondApproval),
            _ => Some(PurchaseRequestStatus::PendingFinalApproval),
        }
    }
}

impl core::fmt::Display for PurchaseRequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            PurchaseRequestStatus::Draft => "Draft",
            PurchaseRequestStatus::Submitted => "Submitted",
            PurchaseRequestStatus::PendingFirstApproval => "PendingFirstApproval",
            PurchaseRequestStatus::PendingSecondApproval => "PendingSecondApproval",
            PurchaseRequestStatus::PendingFinalApproval => "PendingFinalApproval",
            PurchaseRequestStatus::Approved => "Approved",
            PurchaseRequestStatus::Rejected => "Rejected",
            PurchaseRequestStatus::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Pure transition predicate: is `from -> to` present in the table?
pub fn can_transition(from: PurchaseRequestStatus, to: PurchaseRequestStatus) -> bool {
    from.allowed_transitions().contains(&to)
}
