//! Threshold-driven approval flow resolution.
//!
//! How much sign-off a request needs is a business policy, not engine
//! logic: the resolver is configured with ordered amount tiers and maps a
//! request total to the approver chain of the first tier that covers it.
//! No thresholds are hard-coded anywhere in the workflow engine.

use serde::{Deserialize, Serialize};

use reqflow_core::{DomainError, DomainResult, Money, UserId};
use reqflow_purchasing::{ApprovalFlow, ApprovalFlowResolver, FlowStep, MAX_FLOW_STEPS};

/// One approver position within a policy tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproverDef {
    pub approver_id: UserId,
    pub approver_name: String,
    pub approver_role: String,
}

/// One tier of the flow policy: totals up to `up_to` (inclusive) require
/// these approvers, in order. `up_to = None` marks the unbounded last tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTier {
    pub up_to: Option<Money>,
    pub approvers: Vec<ApproverDef>,
}

/// Ordered tiers, ascending by bound. Deserializable so the embedding
/// application can load the policy from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPolicy {
    pub tiers: Vec<FlowTier>,
}

impl FlowPolicy {
    fn validate(&self) -> DomainResult<()> {
        if self.tiers.is_empty() {
            return Err(DomainError::validation(
                "a flow policy requires at least one tier",
            ));
        }

        let mut previous_bound: Option<Money> = None;
        for (idx, tier) in self.tiers.iter().enumerate() {
            if tier.approvers.is_empty() {
                return Err(DomainError::validation(format!(
                    "flow policy tier {idx} has no approvers"
                )));
            }
            if tier.approvers.len() > MAX_FLOW_STEPS {
                return Err(DomainError::validation(format!(
                    "flow policy tier {idx} exceeds {MAX_FLOW_STEPS} approvers"
                )));
            }

            match (previous_bound, tier.up_to) {
                // Only the last tier may be unbounded.
                (_, None) if idx + 1 != self.tiers.len() => {
                    return Err(DomainError::validation(
                        "only the last flow policy tier may be unbounded",
                    ));
                }
                (Some(prev), Some(bound)) if bound <= prev => {
                    return Err(DomainError::validation(
                        "flow policy tier bounds must be strictly ascending",
                    ));
                }
                _ => {}
            }
            previous_bound = tier.up_to;
        }

        if self.tiers.last().is_some_and(|tier| tier.up_to.is_some()) {
            return Err(DomainError::validation(
                "the last flow policy tier must be unbounded",
            ));
        }

        Ok(())
    }
}

/// Maps a request total to the approver chain of the first covering tier.
#[derive(Debug, Clone)]
pub struct ThresholdFlowResolver {
    policy: FlowPolicy,
}

impl ThresholdFlowResolver {
    pub fn new(policy: FlowPolicy) -> DomainResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }
}

impl ApprovalFlowResolver for ThresholdFlowResolver {
    fn resolve(&self, total_amount: Money) -> DomainResult<ApprovalFlow> {
        let tier = self
            .policy
            .tiers
            .iter()
            .find(|tier| tier.up_to.is_none_or(|bound| total_amount <= bound))
            .ok_or_else(|| {
                DomainError::business_rule("no approval tier covers the requested amount")
            })?;

        let steps = tier
            .approvers
            .iter()
            .enumerate()
            .map(|(idx, approver)| FlowStep {
                step_number: (idx as u32) + 1,
                approver_id: approver.approver_id,
                approver_name: approver.approver_name.clone(),
                approver_role: approver.approver_role.clone(),
            })
            .collect();

        ApprovalFlow::new(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approver(name: &str, role: &str) -> ApproverDef {
        ApproverDef {
            approver_id: UserId::new(),
            approver_name: name.to_string(),
            approver_role: role.to_string(),
        }
    }

    /// The illustrative policy from the business docs: one approver under
    /// 100k, two up to 500k, three above.
    fn sample_policy() -> FlowPolicy {
        FlowPolicy {
            tiers: vec![
                FlowTier {
                    up_to: Some(Money::from(100_000)),
                    approvers: vec![approver("Mara", "Manager")],
                },
                FlowTier {
                    up_to: Some(Money::from(500_000)),
                    approvers: vec![approver("Mara", "Manager"), approver("Finn", "Finance")],
                },
                FlowTier {
                    up_to: None,
                    approvers: vec![
                        approver("Mara", "Manager"),
                        approver("Finn", "Finance"),
                        approver("Dana", "Director"),
                    ],
                },
            ],
        }
    }

    #[test]
    fn totals_map_to_ascending_tier_sizes() {
        let resolver = ThresholdFlowResolver::new(sample_policy()).unwrap();

        assert_eq!(resolver.resolve(Money::from(50_000)).unwrap().len(), 1);
        assert_eq!(resolver.resolve(Money::from(150_000)).unwrap().len(), 2);
        assert_eq!(resolver.resolve(Money::from(750_000)).unwrap().len(), 3);
    }

    #[test]
    fn tier_bounds_are_inclusive() {
        let resolver = ThresholdFlowResolver::new(sample_policy()).unwrap();

        assert_eq!(resolver.resolve(Money::from(100_000)).unwrap().len(), 1);
        assert_eq!(resolver.resolve(Money::from(100_001)).unwrap().len(), 2);
        assert_eq!(resolver.resolve(Money::from(500_000)).unwrap().len(), 2);
        assert_eq!(resolver.resolve(Money::from(500_001)).unwrap().len(), 3);
    }

    #[test]
    fn resolved_steps_are_numbered_from_one() {
        let resolver = ThresholdFlowResolver::new(sample_policy()).unwrap();
        let flow = resolver.resolve(Money::from(750_000)).unwrap();

        let numbers: Vec<u32> = flow.steps().iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn policy_without_unbounded_last_tier_is_rejected() {
        let policy = FlowPolicy {
            tiers: vec![FlowTier {
                up_to: Some(Money::from(100_000)),
                approvers: vec![approver("Mara", "Manager")],
            }],
        };
        assert!(ThresholdFlowResolver::new(policy).is_err());
    }

    #[test]
    fn policy_with_descending_bounds_is_rejected() {
        let policy = FlowPolicy {
            tiers: vec![
                FlowTier {
                    up_to: Some(Money::from(500_000)),
                    approvers: vec![approver("Mara", "Manager")],
                },
                FlowTier {
                    up_to: Some(Money::from(100_000)),
                    approvers: vec![approver("Finn", "Finance")],
                },
                FlowTier {
                    up_to: None,
                    approvers: vec![approver("Dana", "Director")],
                },
            ],
        };
        assert!(ThresholdFlowResolver::new(policy).is_err());
    }

    #[test]
    fn empty_tier_is_rejected() {
        let policy = FlowPolicy {
            tiers: vec![FlowTier {
                up_to: None,
                approvers: vec![],
            }],
        };
        assert!(ThresholdFlowResolver::new(policy).is_err());
    }
}
