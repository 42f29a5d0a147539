//! # Routing Initializer
//!
//! Reacts to a document entering review and computes the initial
//! reviewer-activation set: every assignment for parallel fan-out, only the
//! lowest-ordinal assignment for serial chaining.
//!
//! Only the not-routed → routed-for-review transition qualifies; the
//! reacting fields are written for plenty of unrelated reasons and every
//! other pre/post pair is a silent skip.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::events::publisher::lifecycle;
use crate::events::{ChangeKind, EventPublisher, RecordChange};
use crate::models::review_assignment::fields as assignment_fields;
use crate::models::{Document, ReviewAssignment, SnapshotError};
use crate::state_machine::{DistributionStatus, RecordState, RoutingStatus, RoutingType, WorkflowStatus};
use crate::store::{
    describe_failures, BatchFailure, Condition, EntityType, Query, RecordPatch, RecordStore,
    SortDirection, StoreError,
};

/// What one initialization pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializationOutcome {
    /// Pre/post pair did not represent a begin-review transition
    Skipped,
    /// Qualifying transition, but the document has no reviewers (valid, if
    /// arguably a misconfiguration upstream)
    NoAssignments,
    /// Reviewers were activated
    Activated {
        routing_type: RoutingType,
        activated: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    #[error("Pre-image required to initialize routing for document {document}")]
    MissingPreImage { document: Uuid },

    #[error("Document {document} entered review without a routing type")]
    MissingRoutingType { document: Uuid },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Store {operation} failed while initializing document {document}: {source}")]
    Store {
        operation: &'static str,
        document: Uuid,
        #[source]
        source: StoreError,
    },

    #[error("Activation batch partially failed: {}", describe_failures(.failed))]
    PartialFailure { failed: Vec<BatchFailure> },

    #[error("Event publishing failed: {0}")]
    EventPublishing(String),
}

/// Engine that starts a routing cycle when a document is routed for review
pub struct RoutingInitializer {
    store: Arc<dyn RecordStore>,
    publisher: EventPublisher,
}

impl RoutingInitializer {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            publisher: EventPublisher::default(),
        }
    }

    pub fn with_publisher(store: Arc<dyn RecordStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// React to a document update that may represent "begin review".
    #[instrument(skip(self, change), fields(document = %change.id()))]
    pub async fn handle(
        &self,
        change: &RecordChange,
    ) -> Result<InitializationOutcome, InitializationError> {
        let document_id = change.id();
        if change.kind != ChangeKind::Update {
            return Ok(InitializationOutcome::Skipped);
        }
        let pre_record = change
            .pre
            .as_ref()
            .ok_or(InitializationError::MissingPreImage {
                document: document_id,
            })?;

        let pre = Document::from_record(pre_record)?;
        let post = Document::from_record(&change.post)?;

        if !begins_review(&pre, &post) {
            debug!(
                pre_status = %pre.routing_status,
                post_status = %post.routing_status,
                "Not a begin-review transition"
            );
            return Ok(InitializationOutcome::Skipped);
        }

        let routing_type = post
            .routing_type
            .ok_or(InitializationError::MissingRoutingType {
                document: document_id,
            })?;

        let plan = self.routing_plan(document_id).await?;
        if plan.is_empty() {
            info!("Document has no review assignments; empty routing plan");
            return Ok(InitializationOutcome::NoAssignments);
        }

        let activated = match routing_type {
            RoutingType::Parallel => self.activate_all(document_id, &plan).await?,
            RoutingType::Serial => self.activate_first(document_id, &plan).await?,
        };

        self.publisher
            .publish(
                lifecycle::ROUTING_INITIALIZED,
                json!({
                    "document": document_id,
                    "routing_type": routing_type.to_string(),
                    "activated": activated,
                }),
            )
            .await
            .map_err(|e| InitializationError::EventPublishing(e.to_string()))?;

        Ok(InitializationOutcome::Activated {
            routing_type,
            activated,
        })
    }

    /// All live assignments for the document, in review sequence
    async fn routing_plan(
        &self,
        document: Uuid,
    ) -> Result<Vec<ReviewAssignment>, InitializationError> {
        let query = Query::new()
            .and(Condition::eq(
                assignment_fields::PARENT_DOCUMENT,
                document.to_string(),
            ))
            .and(Condition::eq(
                assignment_fields::STATE,
                RecordState::Active.to_string(),
            ))
            .order_by(assignment_fields::ORDER, SortDirection::Ascending)
            .order_by(assignment_fields::CREATED_AT, SortDirection::Ascending);

        let records = self
            .store
            .find(EntityType::ReviewAssignment, query)
            .await
            .map_err(|source| InitializationError::Store {
                operation: "find",
                document,
                source,
            })?;

        records
            .iter()
            .map(ReviewAssignment::from_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(InitializationError::from)
    }

    /// Parallel fan-out: every reviewer becomes pending in one batch
    async fn activate_all(
        &self,
        document: Uuid,
        plan: &[ReviewAssignment],
    ) -> Result<usize, InitializationError> {
        let patches: Vec<RecordPatch> = plan.iter().map(activation_patch).collect();
        let outcome = self
            .store
            .write_batch(patches)
            .await
            .map_err(|source| InitializationError::Store {
                operation: "write_batch",
                document,
                source,
            })?;

        if outcome.has_failures() {
            return Err(InitializationError::PartialFailure {
                failed: outcome.failed,
            });
        }

        for assignment in plan {
            self.publish_activation(document, assignment).await?;
        }
        Ok(plan.len())
    }

    /// Serial chaining: only the lowest-ordinal reviewer starts
    async fn activate_first(
        &self,
        document: Uuid,
        plan: &[ReviewAssignment],
    ) -> Result<usize, InitializationError> {
        let first = &plan[0];
        self.store
            .write_one(activation_patch(first))
            .await
            .map_err(|source| InitializationError::Store {
                operation: "write_one",
                document,
                source,
            })?;

        self.publish_activation(document, first).await?;
        Ok(1)
    }

    async fn publish_activation(
        &self,
        document: Uuid,
        assignment: &ReviewAssignment,
    ) -> Result<(), InitializationError> {
        self.publisher
            .publish(
                lifecycle::REVIEWER_ACTIVATED,
                json!({
                    "document": document,
                    "assignment": assignment.id,
                    "reviewer": assignment.reviewer,
                    "order": assignment.order,
                }),
            )
            .await
            .map_err(|e| InitializationError::EventPublishing(e.to_string()))
    }
}

/// Activation hands the assignment to its reviewer and marks it pending
fn activation_patch(assignment: &ReviewAssignment) -> RecordPatch {
    RecordPatch::new(EntityType::ReviewAssignment, assignment.id)
        .with_field(
            assignment_fields::DISTRIBUTION_STATUS,
            DistributionStatus::IsPending.to_string(),
        )
        .with_field(assignment_fields::OWNER, assignment.reviewer.to_string())
}

/// The one qualifying transition: not yet routed before, routed for review
/// after.
fn begins_review(pre: &Document, post: &Document) -> bool {
    pre.routing_status == RoutingStatus::NotRouted
        && pre.workflow_status == WorkflowStatus::NotStarted
        && post.routing_status == RoutingStatus::RoutedForReview
}
