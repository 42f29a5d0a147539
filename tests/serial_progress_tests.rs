//! Serial progress integration tests: chaining, finalization, rejection
//! short-circuit, and the ownership hand-back.

mod common;

use common::*;
use std::sync::Arc;

use docrouter_core::config::{RejectionPolicy, RouterConfig};
use docrouter_core::orchestration::{ChangeDispatcher, Dispatch, ProgressOutcome};
use docrouter_core::state_machine::{
    DistributionStatus, RoutingStatus, RoutingType, WorkflowStatus,
};
use docrouter_core::store::{EntityType, InMemoryRecordStore};

/// Document mid-cycle with the first reviewer active and the rest queued
fn mid_cycle(
    store: &Arc<InMemoryRecordStore>,
    reviewers: i64,
) -> (
    docrouter_core::models::Document,
    Vec<docrouter_core::models::ReviewAssignment>,
) {
    let document = DocumentBuilder::new()
        .with_routing_type(RoutingType::Serial)
        .with_routing_status(RoutingStatus::RoutedForReview)
        .with_workflow_status(WorkflowStatus::InProgress)
        .build(store);
    let assignments: Vec<_> = (0..reviewers)
        .map(|order| {
            let status = if order == 0 {
                DistributionStatus::IsPending
            } else {
                DistributionStatus::NotStarted
            };
            AssignmentBuilder::new(document.id, order)
                .with_status(status)
                .build(store)
        })
        .collect();
    (document, assignments)
}

#[tokio::test]
async fn completing_promotes_exactly_the_next_reviewer() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let (document, assignments) = mid_cycle(&store, 3);

    let change = status_change(&store, assignments[0].id, DistributionStatus::Complete);
    let dispatch = dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(
        dispatch,
        Dispatch::Progressed(ProgressOutcome::Advanced {
            document: document.id,
            next_assignment: assignments[1].id,
            reviewer: assignments[1].reviewer,
        })
    );

    assert_eq!(
        stored_status(&store, assignments[1].id),
        DistributionStatus::IsPending
    );
    assert_eq!(
        stored_owner(&store, EntityType::ReviewAssignment, assignments[1].id),
        assignments[1].reviewer
    );
    // The third reviewer is not touched yet
    assert_eq!(
        stored_status(&store, assignments[2].id),
        DistributionStatus::NotStarted
    );
    // The document stays in review
    let doc = stored_document(&store, document.id);
    assert_eq!(doc.routing_status, RoutingStatus::RoutedForReview);
}

#[tokio::test]
async fn completed_assignment_is_handed_back_to_the_document_owner() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let (document, assignments) = mid_cycle(&store, 2);

    let change = status_change(&store, assignments[0].id, DistributionStatus::Complete);
    dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(
        stored_owner(&store, EntityType::ReviewAssignment, assignments[0].id),
        document.owner
    );
}

#[tokio::test]
async fn completing_the_last_reviewer_finalizes_the_document() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let (document, assignments) = mid_cycle(&store, 1);

    let change = status_change(&store, assignments[0].id, DistributionStatus::Complete);
    let dispatch = dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(
        dispatch,
        Dispatch::Progressed(ProgressOutcome::Finalized {
            document: document.id
        })
    );

    let doc = stored_document(&store, document.id);
    assert_eq!(doc.routing_status, RoutingStatus::ReviewComplete);
    assert_eq!(doc.workflow_status, WorkflowStatus::PendingInitiatorAction);
    assert_eq!(
        stored_owner(&store, EntityType::ReviewAssignment, assignments[0].id),
        document.owner
    );
}

#[tokio::test]
async fn full_serial_chain_runs_to_completion() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let (document, assignments) = mid_cycle(&store, 3);

    for (index, assignment) in assignments.iter().enumerate() {
        let change = status_change(&store, assignment.id, DistributionStatus::Complete);
        let dispatch = dispatcher.on_record_changed(change).await.unwrap();
        if index + 1 < assignments.len() {
            assert!(matches!(
                dispatch,
                Dispatch::Progressed(ProgressOutcome::Advanced { .. })
            ));
        } else {
            assert!(matches!(
                dispatch,
                Dispatch::Progressed(ProgressOutcome::Finalized { .. })
            ));
        }
    }

    let doc = stored_document(&store, document.id);
    assert_eq!(doc.routing_status, RoutingStatus::ReviewComplete);
}

#[tokio::test]
async fn rejection_terminates_and_leaves_outstanding_untouched() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let (document, assignments) = mid_cycle(&store, 3);

    let change = status_change(&store, assignments[0].id, DistributionStatus::Rejected);
    let dispatch = dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(
        dispatch,
        Dispatch::Progressed(ProgressOutcome::Terminated {
            document: document.id,
            cancelled_outstanding: 0,
        })
    );

    let doc = stored_document(&store, document.id);
    assert_eq!(doc.workflow_status, WorkflowStatus::Terminated);
    assert_eq!(doc.routing_status, RoutingStatus::RejectedByReviewer);

    // Default policy: remaining assignments stay exactly as they were
    for outstanding in &assignments[1..] {
        assert_eq!(
            stored_status(&store, outstanding.id),
            DistributionStatus::NotStarted
        );
    }
}

#[tokio::test]
async fn cancel_outstanding_policy_closes_the_remaining_assignments() {
    let store = store();
    let mut config = RouterConfig::default();
    config.rejection.policy = RejectionPolicy::CancelOutstanding;
    let dispatcher = ChangeDispatcher::from_config(store.clone(), &config);
    let (document, assignments) = mid_cycle(&store, 3);

    let change = status_change(&store, assignments[0].id, DistributionStatus::Rejected);
    let dispatch = dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(
        dispatch,
        Dispatch::Progressed(ProgressOutcome::Terminated {
            document: document.id,
            cancelled_outstanding: 2,
        })
    );

    for outstanding in &assignments[1..] {
        assert_eq!(
            stored_status(&store, outstanding.id),
            DistributionStatus::Rejected
        );
    }
}

#[tokio::test]
async fn non_pending_pre_image_is_silently_skipped() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let (_, assignments) = mid_cycle(&store, 2);

    // The queued reviewer jumps straight to complete without ever pending
    let change = status_change(&store, assignments[1].id, DistributionStatus::Complete);
    let dispatch = dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(dispatch, Dispatch::Progressed(ProgressOutcome::Skipped));
    assert!(store.write_log().is_empty());
}

#[tokio::test]
async fn activation_echo_is_not_a_completion() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let (_, assignments) = mid_cycle(&store, 2);

    // NotStarted -> IsPending is the initializer's own doing; the progress
    // machine must not react to it
    let change = status_change(&store, assignments[1].id, DistributionStatus::IsPending);
    let dispatch = dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(dispatch, Dispatch::Progressed(ProgressOutcome::Skipped));
    assert!(store.write_log().is_empty());
}

#[tokio::test]
async fn parallel_completions_finalize_only_when_none_remain_queued() {
    let store = store();
    let dispatcher = ChangeDispatcher::new(store.clone());
    let document = DocumentBuilder::new()
        .with_routing_type(RoutingType::Parallel)
        .with_routing_status(RoutingStatus::RoutedForReview)
        .build(&store);
    let assignments: Vec<_> = (0..2)
        .map(|order| {
            AssignmentBuilder::new(document.id, order)
                .with_status(DistributionStatus::IsPending)
                .build(&store)
        })
        .collect();

    // With every reviewer already pending there is nothing queued, so the
    // first completion finalizes the document
    let change = status_change(&store, assignments[0].id, DistributionStatus::Complete);
    let dispatch = dispatcher.on_record_changed(change).await.unwrap();

    assert_eq!(
        dispatch,
        Dispatch::Progressed(ProgressOutcome::Finalized {
            document: document.id
        })
    );
}
