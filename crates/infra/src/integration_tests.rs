//! Integration tests for the full approval pipeline.
//!
//! Tests: ApprovalService -> RequestStore -> EventSink
//!
//! Verifies:
//! - The documented request lifecycles end to end (submit, approve chains,
//!   reject, cancel, draft deletion)
//! - Exactly one envelope reaches the sink per externally meaningful
//!   operation
//! - Optimistic concurrency conflicts are detected on stale saves

use std::sync::Arc;

use reqflow_core::{AggregateRoot, DomainError, ExpectedVersion, Money, UserId};
use reqflow_events::{EventEnvelope, EventSink, InMemoryEventSink, Subscription};
use reqflow_purchasing::{
    ApprovalStepStatus, ProductId, PurchaseRequestEvent, PurchaseRequestStatus,
};

use crate::resolver::{ApproverDef, FlowPolicy, FlowTier, ThresholdFlowResolver};
use crate::service::{ApprovalService, ServiceError};
use crate::store::{InMemoryRequestStore, RequestStore, StoreError};

type Sink = Arc<InMemoryEventSink<EventEnvelope<PurchaseRequestEvent>>>;
type Service = ApprovalService<Arc<InMemoryRequestStore>, Sink, ThresholdFlowResolver>;

fn approver(name: &str) -> ApproverDef {
    ApproverDef {
        approver_id: UserId::new(),
        approver_name: name.to_string(),
        approver_role: "Manager".to_string(),
    }
}

/// Every request resolves to the given approver chain, regardless of total.
fn fixed_policy(approvers: Vec<ApproverDef>) -> FlowPolicy {
    FlowPolicy {
        tiers: vec![FlowTier {
            up_to: None,
            approvers,
        }],
    }
}

fn setup(
    policy: FlowPolicy,
) -> (
    Service,
    Arc<InMemoryRequestStore>,
    Subscription<EventEnvelope<PurchaseRequestEvent>>,
) {
    let store = Arc::new(InMemoryRequestStore::new());
    let sink: Sink = Arc::new(InMemoryEventSink::new());
    let subscription = sink.subscribe();
    let resolver = ThresholdFlowResolver::new(policy).unwrap();
    let service = ApprovalService::new(store.clone(), sink, resolver);
    (service, store, subscription)
}

fn drain(subscription: &Subscription<EventEnvelope<PurchaseRequestEvent>>) -> Vec<EventEnvelope<PurchaseRequestEvent>> {
    let mut envelopes = Vec::new();
    while let Ok(envelope) = subscription.try_recv() {
        envelopes.push(envelope);
    }
    envelopes
}

fn test_product_id() -> ProductId {
    ProductId::new(reqflow_core::AggregateId::new())
}

#[test]
fn submitted_request_has_one_pending_step_for_its_approver() {
    let signer = approver("Bea");
    let (service, _, subscription) = setup(fixed_policy(vec![signer.clone()]));
    let requester = UserId::new();

    let request_id = service
        .create_request(requester, "Alice", "Laptops", "Q4 laptops")
        .unwrap();
    service
        .add_item(request_id, test_product_id(), "Laptop", Money::from(150_000), 1)
        .unwrap();
    service.submit(request_id).unwrap();

    let request = service.get(request_id).unwrap();
    assert_eq!(request.status(), PurchaseRequestStatus::Submitted);
    assert_eq!(request.total_amount(), Money::from(150_000));
    assert_eq!(request.steps().len(), 1);
    assert!(request.steps()[0].is_pending());
    assert_eq!(request.steps()[0].approver_id(), signer.approver_id);

    let envelopes = drain(&subscription);
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].aggregate_type(), "purchasing.request");
    assert!(matches!(
        envelopes[0].payload(),
        PurchaseRequestEvent::PurchaseRequestSubmitted(_)
    ));
}

#[test]
fn single_approval_completes_the_request_and_reaches_the_sink() {
    let signer = approver("Bea");
    let (service, _, subscription) = setup(fixed_policy(vec![signer.clone()]));
    let requester = UserId::new();

    let request_id = service
        .create_request(requester, "Alice", "Laptops", "Q4 laptops")
        .unwrap();
    service
        .add_item(request_id, test_product_id(), "Laptop", Money::from(150_000), 1)
        .unwrap();
    service.submit(request_id).unwrap();
    service
        .approve(request_id, signer.approver_id, Some("ok".to_string()))
        .unwrap();

    let request = service.get(request_id).unwrap();
    assert_eq!(request.status(), PurchaseRequestStatus::Approved);
    assert_eq!(request.steps()[0].status(), ApprovalStepStatus::Approved);
    assert!(request.approved_at().is_some());

    let envelopes = drain(&subscription);
    assert_eq!(envelopes.len(), 2);
    match envelopes[1].payload() {
        PurchaseRequestEvent::PurchaseRequestApproved(e) => {
            assert_eq!(e.approver_id, signer.approver_id);
            assert_eq!(e.total_amount, Money::from(150_000));
        }
        other => panic!("Expected PurchaseRequestApproved, got {other:?}"),
    }
    assert!(envelopes[1].sequence_number() > envelopes[0].sequence_number());
}

#[test]
fn rejection_records_the_reason() {
    let signer = approver("Bea");
    let (service, _, subscription) = setup(fixed_policy(vec![signer.clone()]));

    let request_id = service
        .create_request(UserId::new(), "Alice", "Laptops", "")
        .unwrap();
    service
        .add_item(request_id, test_product_id(), "Laptop", Money::from(150_000), 1)
        .unwrap();
    service.submit(request_id).unwrap();
    service
        .reject(request_id, signer.approver_id, "budget")
        .unwrap();

    let request = service.get(request_id).unwrap();
    assert_eq!(request.status(), PurchaseRequestStatus::Rejected);
    assert_eq!(request.steps()[0].status(), ApprovalStepStatus::Rejected);
    assert_eq!(request.steps()[0].comment(), Some("budget"));

    let envelopes = drain(&subscription);
    match envelopes.last().unwrap().payload() {
        PurchaseRequestEvent::PurchaseRequestRejected(e) => assert_eq!(e.reason, "budget"),
        other => panic!("Expected PurchaseRequestRejected, got {other:?}"),
    }
}

#[test]
fn two_step_flow_passes_through_both_approvers() {
    let (first, second) = (approver("Bea"), approver("Finn"));
    let (service, _, _) = setup(fixed_policy(vec![first.clone(), second.clone()]));

    let request_id = service
        .create_request(UserId::new(), "Alice", "Servers", "")
        .unwrap();
    service
        .add_item(request_id, test_product_id(), "Server", Money::from(300_000), 1)
        .unwrap();
    service.submit(request_id).unwrap();

    service.approve(request_id, first.approver_id, None).unwrap();
    let request = service.get(request_id).unwrap();
    assert_eq!(request.status(), PurchaseRequestStatus::PendingSecondApproval);
    assert_eq!(request.steps()[0].status(), ApprovalStepStatus::Approved);
    assert!(request.steps()[1].is_pending());

    service.approve(request_id, second.approver_id, None).unwrap();
    let request = service.get(request_id).unwrap();
    assert_eq!(request.status(), PurchaseRequestStatus::Approved);
}

#[test]
fn requester_cancellation_is_terminal() {
    let (service, _, subscription) = setup(fixed_policy(vec![approver("Bea")]));
    let requester = UserId::new();

    let request_id = service
        .create_request(requester, "Alice", "Laptops", "")
        .unwrap();
    service
        .add_item(request_id, test_product_id(), "Laptop", Money::from(1_000), 2)
        .unwrap();
    service.submit(request_id).unwrap();
    service.cancel(request_id, requester).unwrap();

    let request = service.get(request_id).unwrap();
    assert_eq!(request.status(), PurchaseRequestStatus::Cancelled);
    assert!(request.cancelled_at().is_some());

    let err = service.cancel(request_id, requester).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidStateTransition { .. })
    ));

    let envelopes = drain(&subscription);
    assert!(matches!(
        envelopes.last().unwrap().payload(),
        PurchaseRequestEvent::PurchaseRequestCancelled(_)
    ));
}

#[test]
fn items_are_frozen_after_submission() {
    let (service, _, _) = setup(fixed_policy(vec![approver("Bea")]));

    let request_id = service
        .create_request(UserId::new(), "Alice", "Laptops", "")
        .unwrap();
    service
        .add_item(request_id, test_product_id(), "Laptop", Money::from(1_000), 1)
        .unwrap();
    service.submit(request_id).unwrap();

    let err = service
        .add_item(request_id, test_product_id(), "Late", Money::from(10), 1)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidState(_))
    ));
    assert_eq!(service.get(request_id).unwrap().items().len(), 1);
}

#[test]
fn flow_size_follows_the_amount_tiers() {
    let (m, f, d) = (approver("Mara"), approver("Finn"), approver("Dana"));
    let policy = FlowPolicy {
        tiers: vec![
            FlowTier {
                up_to: Some(Money::from(100_000)),
                approvers: vec![m.clone()],
            },
            FlowTier {
                up_to: Some(Money::from(500_000)),
                approvers: vec![m.clone(), f.clone()],
            },
            FlowTier {
                up_to: None,
                approvers: vec![m, f, d],
            },
        ],
    };
    let (service, _, _) = setup(policy);

    let small = service
        .create_request(UserId::new(), "Alice", "Stationery", "")
        .unwrap();
    service
        .add_item(small, test_product_id(), "Pens", Money::from(50_000), 1)
        .unwrap();
    service.submit(small).unwrap();
    assert_eq!(service.get(small).unwrap().steps().len(), 1);

    let large = service
        .create_request(UserId::new(), "Alice", "Rack", "")
        .unwrap();
    service
        .add_item(large, test_product_id(), "Rack", Money::from(750_000), 1)
        .unwrap();
    service.submit(large).unwrap();
    assert_eq!(service.get(large).unwrap().steps().len(), 3);
}

#[test]
fn stale_writer_gets_a_version_conflict() {
    let signer = approver("Bea");
    let (service, store, _) = setup(fixed_policy(vec![signer.clone()]));

    let request_id = service
        .create_request(UserId::new(), "Alice", "Laptops", "")
        .unwrap();
    service
        .add_item(request_id, test_product_id(), "Laptop", Money::from(1_000), 1)
        .unwrap();
    service.submit(request_id).unwrap();

    // Two approvers race: both load the same revision, one wins.
    let stale = store.load(request_id).unwrap();
    service.approve(request_id, signer.approver_id, None).unwrap();

    let err = store
        .save(&stale, ExpectedVersion::Exact(stale.version()))
        .unwrap_err();
    assert!(matches!(err, StoreError::VersionConflict(_)));

    // The loser reloads and sees the decided request.
    let reloaded = store.load(request_id).unwrap();
    assert_eq!(reloaded.status(), PurchaseRequestStatus::Approved);
}

#[test]
fn drafts_are_deleted_not_cancelled() {
    let (service, _, _) = setup(fixed_policy(vec![approver("Bea")]));
    let requester = UserId::new();

    let request_id = service
        .create_request(requester, "Alice", "Laptops", "")
        .unwrap();

    let err = service.cancel(request_id, requester).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidStateTransition { .. })
    ));

    let err = service.delete_draft(request_id, UserId::new()).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::Unauthorized)
    ));

    service.delete_draft(request_id, requester).unwrap();
    assert!(matches!(
        service.get(request_id).unwrap_err(),
        ServiceError::NotFound
    ));
}
