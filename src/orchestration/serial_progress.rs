//! # Serial Progress Processor
//!
//! Drives a routing cycle forward whenever the active reviewer finishes.
//!
//! A reviewer completing promotes the next not-started assignment in ordinal
//! sequence, or finalizes the document when none remains. A reviewer
//! rejecting terminates the cycle immediately. Either way the completed
//! assignment is handed back to the document's owner so the initiating party
//! regains control of the task record.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::RejectionPolicy;
use crate::events::publisher::lifecycle;
use crate::events::{ChangeKind, EventPublisher, RecordChange};
use crate::models::document::fields as document_fields;
use crate::models::review_assignment::fields as assignment_fields;
use crate::models::{require_uuid, ReviewAssignment, SnapshotError};
use crate::state_machine::{
    DistributionStatus, RecordState, RoutingStatus, WorkflowStatus,
};
use crate::store::{
    describe_failures, BatchFailure, Condition, EntityType, Query, Record, RecordPatch,
    RecordStore, SortDirection, StoreError,
};

/// What one progress pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOutcome {
    /// Pre/post pair was not an active-reviewer completion or rejection
    Skipped,
    /// The next reviewer in sequence was activated
    Advanced {
        document: Uuid,
        next_assignment: Uuid,
        reviewer: Uuid,
    },
    /// No reviewer remained; the document finished review
    Finalized { document: Uuid },
    /// The reviewer rejected; the cycle was terminated
    Terminated {
        document: Uuid,
        cancelled_outstanding: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    #[error("Pre-image required to progress assignment {assignment}")]
    MissingPreImage { assignment: Uuid },

    #[error("Assignment {assignment} carries no parent document reference")]
    MissingParent { assignment: Uuid },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Store {operation} failed while progressing document {document}: {source}")]
    Store {
        operation: &'static str,
        document: Uuid,
        #[source]
        source: StoreError,
    },

    #[error("Outstanding-assignment cancellation partially failed: {}", describe_failures(.failed))]
    PartialFailure { failed: Vec<BatchFailure> },

    #[error("Event publishing failed: {0}")]
    EventPublishing(String),
}

/// Engine reacting to the active reviewer finishing their assignment
pub struct SerialProgressProcessor {
    store: Arc<dyn RecordStore>,
    publisher: EventPublisher,
    rejection_policy: RejectionPolicy,
}

impl SerialProgressProcessor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            publisher: EventPublisher::default(),
            rejection_policy: RejectionPolicy::default(),
        }
    }

    pub fn with_publisher(store: Arc<dyn RecordStore>, publisher: EventPublisher) -> Self {
        Self {
            store,
            publisher,
            rejection_policy: RejectionPolicy::default(),
        }
    }

    pub fn with_components(
        store: Arc<dyn RecordStore>,
        publisher: EventPublisher,
        rejection_policy: RejectionPolicy,
    ) -> Self {
        Self {
            store,
            publisher,
            rejection_policy,
        }
    }

    /// React to an assignment update that may be the active reviewer
    /// completing or rejecting.
    #[instrument(skip(self, change), fields(assignment = %change.id()))]
    pub async fn handle(&self, change: &RecordChange) -> Result<ProgressOutcome, ProgressError> {
        let assignment_id = change.id();
        if change.kind != ChangeKind::Update {
            return Ok(ProgressOutcome::Skipped);
        }
        let pre = change.pre.as_ref().ok_or(ProgressError::MissingPreImage {
            assignment: assignment_id,
        })?;

        let pre_status: DistributionStatus =
            crate::models::require_status(pre, assignment_fields::DISTRIBUTION_STATUS)?;
        let post_status: DistributionStatus =
            crate::models::require_status(&change.post, assignment_fields::DISTRIBUTION_STATUS)?;

        if pre_status != DistributionStatus::IsPending {
            debug!(%pre_status, "Previous distribution status was not pending");
            return Ok(ProgressOutcome::Skipped);
        }
        if !post_status.is_terminal() {
            debug!(%post_status, "Distribution status change is not a completion");
            return Ok(ProgressOutcome::Skipped);
        }

        let document = self.parent_document(change)?;

        if post_status == DistributionStatus::Rejected {
            self.terminate(document, assignment_id).await
        } else {
            self.advance(document, assignment_id).await
        }
    }

    /// Rejection short-circuits the whole cycle
    async fn terminate(
        &self,
        document: Uuid,
        assignment: Uuid,
    ) -> Result<ProgressOutcome, ProgressError> {
        info!(%document, "Reviewer rejected; terminating workflow");

        let patch = RecordPatch::new(EntityType::Document, document)
            .with_field(
                document_fields::WORKFLOW_STATUS,
                WorkflowStatus::Terminated.to_string(),
            )
            .with_field(
                document_fields::ROUTING_STATUS,
                RoutingStatus::RejectedByReviewer.to_string(),
            );
        self.store
            .write_one(patch)
            .await
            .map_err(|source| ProgressError::Store {
                operation: "write_one",
                document,
                source,
            })?;

        let cancelled_outstanding = match self.rejection_policy {
            RejectionPolicy::LeaveOutstanding => 0,
            RejectionPolicy::CancelOutstanding => self.cancel_outstanding(document).await?,
        };

        self.publisher
            .publish(
                lifecycle::WORKFLOW_TERMINATED,
                json!({
                    "document": document,
                    "assignment": assignment,
                    "cancelled_outstanding": cancelled_outstanding,
                }),
            )
            .await
            .map_err(|e| ProgressError::EventPublishing(e.to_string()))?;

        Ok(ProgressOutcome::Terminated {
            document,
            cancelled_outstanding,
        })
    }

    /// Completion promotes the next reviewer or finalizes the document, and
    /// always hands the finished assignment back to the document owner.
    async fn advance(
        &self,
        document: Uuid,
        completed: Uuid,
    ) -> Result<ProgressOutcome, ProgressError> {
        let document_record = self
            .store
            .get(EntityType::Document, document, &[document_fields::OWNER])
            .await
            .map_err(|source| ProgressError::Store {
                operation: "get",
                document,
                source,
            })?;
        let document_owner = require_uuid(&document_record, document_fields::OWNER)?;

        let outcome = match self.next_assignment(document).await? {
            Some(next) => {
                info!(next_assignment = %next.id, order = next.order, "Promoting next reviewer");
                self.store
                    .write_one(activation_patch(&next))
                    .await
                    .map_err(|source| ProgressError::Store {
                        operation: "write_one",
                        document,
                        source,
                    })?;

                self.publisher
                    .publish(
                        lifecycle::REVIEWER_ACTIVATED,
                        json!({
                            "document": document,
                            "assignment": next.id,
                            "reviewer": next.reviewer,
                            "order": next.order,
                        }),
                    )
                    .await
                    .map_err(|e| ProgressError::EventPublishing(e.to_string()))?;

                ProgressOutcome::Advanced {
                    document,
                    next_assignment: next.id,
                    reviewer: next.reviewer,
                }
            }
            None => {
                info!(%document, "No reviewers remain; review complete");
                let patch = RecordPatch::new(EntityType::Document, document)
                    .with_field(
                        document_fields::ROUTING_STATUS,
                        RoutingStatus::ReviewComplete.to_string(),
                    )
                    .with_field(
                        document_fields::WORKFLOW_STATUS,
                        WorkflowStatus::PendingInitiatorAction.to_string(),
                    );
                self.store
                    .write_one(patch)
                    .await
                    .map_err(|source| ProgressError::Store {
                        operation: "write_one",
                        document,
                        source,
                    })?;

                self.publisher
                    .publish(
                        lifecycle::REVIEW_COMPLETE,
                        json!({ "document": document }),
                    )
                    .await
                    .map_err(|e| ProgressError::EventPublishing(e.to_string()))?;

                ProgressOutcome::Finalized { document }
            }
        };

        // The initiating party regains control of the finished task record
        let handback = RecordPatch::new(EntityType::ReviewAssignment, completed)
            .with_field(assignment_fields::OWNER, document_owner.to_string());
        self.store
            .write_one(handback)
            .await
            .map_err(|source| ProgressError::Store {
                operation: "write_one",
                document,
                source,
            })?;

        Ok(outcome)
    }

    /// Lowest-ordinal assignment that has not started yet, if any
    async fn next_assignment(
        &self,
        document: Uuid,
    ) -> Result<Option<ReviewAssignment>, ProgressError> {
        let query = Query::new()
            .and(Condition::eq(
                assignment_fields::PARENT_DOCUMENT,
                document.to_string(),
            ))
            .and(Condition::eq(
                assignment_fields::DISTRIBUTION_STATUS,
                DistributionStatus::NotStarted.to_string(),
            ))
            .and(Condition::eq(
                assignment_fields::STATE,
                RecordState::Active.to_string(),
            ))
            .order_by(assignment_fields::ORDER, SortDirection::Ascending)
            .order_by(assignment_fields::CREATED_AT, SortDirection::Ascending)
            .with_limit(1);

        let records = self
            .store
            .find(EntityType::ReviewAssignment, query)
            .await
            .map_err(|source| ProgressError::Store {
                operation: "find",
                document,
                source,
            })?;

        records
            .first()
            .map(ReviewAssignment::from_record)
            .transpose()
            .map_err(ProgressError::from)
    }

    /// Cancel-outstanding rejection policy: remaining not-started
    /// assignments are closed out in one internal-marked batch.
    async fn cancel_outstanding(&self, document: Uuid) -> Result<usize, ProgressError> {
        let query = Query::new()
            .and(Condition::eq(
                assignment_fields::PARENT_DOCUMENT,
                document.to_string(),
            ))
            .and(Condition::eq(
                assignment_fields::DISTRIBUTION_STATUS,
                DistributionStatus::NotStarted.to_string(),
            ))
            .and(Condition::eq(
                assignment_fields::STATE,
                RecordState::Active.to_string(),
            ));

        let outstanding: Vec<Record> = self
            .store
            .find(EntityType::ReviewAssignment, query)
            .await
            .map_err(|source| ProgressError::Store {
                operation: "find",
                document,
                source,
            })?;

        if outstanding.is_empty() {
            return Ok(0);
        }

        let patches: Vec<RecordPatch> = outstanding
            .iter()
            .map(|record| {
                RecordPatch::new(EntityType::ReviewAssignment, record.id)
                    .with_field(
                        assignment_fields::DISTRIBUTION_STATUS,
                        DistributionStatus::Rejected.to_string(),
                    )
                    .mark_internal()
            })
            .collect();

        let outcome = self
            .store
            .write_batch(patches)
            .await
            .map_err(|source| ProgressError::Store {
                operation: "write_batch",
                document,
                source,
            })?;

        if outcome.has_failures() {
            return Err(ProgressError::PartialFailure {
                failed: outcome.failed,
            });
        }
        Ok(outcome.succeeded.len())
    }

    fn parent_document(&self, change: &RecordChange) -> Result<Uuid, ProgressError> {
        change
            .post
            .uuid(assignment_fields::PARENT_DOCUMENT)
            .or_else(|| {
                change
                    .pre
                    .as_ref()
                    .and_then(|pre| pre.uuid(assignment_fields::PARENT_DOCUMENT))
            })
            .ok_or(ProgressError::MissingParent {
                assignment: change.id(),
            })
    }
}

fn activation_patch(assignment: &ReviewAssignment) -> RecordPatch {
    RecordPatch::new(EntityType::ReviewAssignment, assignment.id)
        .with_field(
            assignment_fields::DISTRIBUTION_STATUS,
            DistributionStatus::IsPending.to_string(),
        )
        .with_field(assignment_fields::OWNER, assignment.reviewer.to_string())
}
