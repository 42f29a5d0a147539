//! # Ordering Engine
//!
//! Keeps sibling review assignments' ordinals duplicate-free across inserts
//! and moves.
//!
//! When an assignment is created at ordinal `n`, every live sibling at `n`
//! or later shifts one slot later. When an assignment moves, only the
//! siblings inside the vacated/claimed range shift, preserving the relative
//! order of everything else. Shift writes are internal-marked so the
//! dispatcher never routes them back into this engine.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::events::publisher::lifecycle;
use crate::events::{ChangeKind, EventPublisher, RecordChange};
use crate::models::review_assignment::fields;
use crate::state_machine::RecordState;
use crate::store::{
    describe_failures, BatchFailure, Condition, EntityType, Query, RecordPatch, RecordStore,
    SortDirection, StoreError, ID_FIELD,
};

/// Result of one reorder pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSummary {
    /// Siblings whose ordinal was rewritten
    pub shifted: usize,
    /// Amount each affected sibling moved (+1 or -1; 0 for a no-op)
    pub delta: i64,
}

impl ShiftSummary {
    fn noop() -> Self {
        Self {
            shifted: 0,
            delta: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderingError {
    #[error("Assignment {id} was created without an ordinal")]
    MissingOrder { id: Uuid },

    #[error("Invalid ordinal on assignment {id}: {value}")]
    InvalidOrdinal { id: Uuid, value: String },

    #[error("Pre-image required to reorder assignment {id}")]
    MissingPreImage { id: Uuid },

    #[error("Pre-image for assignment {id} is missing its ordinal")]
    PreImageMissingOrder { id: Uuid },

    #[error("Assignment {id} carries no parent document reference")]
    MissingParent { id: Uuid },

    #[error("Store {operation} failed while reordering assignments for document {document}: {source}")]
    Store {
        operation: &'static str,
        document: Uuid,
        #[source]
        source: StoreError,
    },

    #[error("Reorder batch partially failed: {}", describe_failures(.failed))]
    PartialFailure { failed: Vec<BatchFailure> },

    #[error("Event publishing failed: {0}")]
    EventPublishing(String),
}

/// The range of sibling ordinals a change disturbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftWindow {
    /// Insert at `n`: everything at or past `n` moves later
    From(i64),
    /// Move: only ordinals inside the inclusive range move
    Between(i64, i64),
}

/// Engine maintaining ordinal uniqueness within a document's assignment set
pub struct OrderingEngine {
    store: Arc<dyn RecordStore>,
    publisher: EventPublisher,
}

impl OrderingEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            publisher: EventPublisher::default(),
        }
    }

    pub fn with_publisher(store: Arc<dyn RecordStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// React to an assignment created with an ordinal or moved to a new one.
    #[instrument(skip(self, change), fields(assignment = %change.id(), kind = %change.kind))]
    pub async fn handle(&self, change: &RecordChange) -> Result<ShiftSummary, OrderingError> {
        let id = change.id();
        let new_order = self.target_ordinal(change)?;

        let (window, delta) = match change.kind {
            ChangeKind::Create => (ShiftWindow::From(new_order), 1),
            ChangeKind::Update => {
                let old_order = self.previous_ordinal(change)?;
                if new_order == old_order {
                    return Ok(ShiftSummary::noop());
                }
                if new_order < old_order {
                    (ShiftWindow::Between(new_order, old_order - 1), 1)
                } else {
                    (ShiftWindow::Between(old_order + 1, new_order), -1)
                }
            }
        };

        let parent = self.parent_document(change)?;
        let affected = self
            .store
            .find(EntityType::ReviewAssignment, sibling_query(id, parent, window))
            .await
            .map_err(|source| OrderingError::Store {
                operation: "find",
                document: parent,
                source,
            })?;

        debug!(affected = affected.len(), ?window, "Computed reorder window");

        if affected.is_empty() {
            return Ok(ShiftSummary::noop());
        }

        let patches: Vec<RecordPatch> = affected
            .iter()
            .map(|sibling| {
                let current = sibling.int(fields::ORDER).unwrap_or(0);
                RecordPatch::new(EntityType::ReviewAssignment, sibling.id)
                    .with_field(fields::ORDER, current + delta)
                    .mark_internal()
            })
            .collect();

        let outcome = self
            .store
            .write_batch(patches)
            .await
            .map_err(|source| OrderingError::Store {
                operation: "write_batch",
                document: parent,
                source,
            })?;

        if outcome.has_failures() {
            return Err(OrderingError::PartialFailure {
                failed: outcome.failed,
            });
        }

        let shifted = outcome.succeeded.len();
        self.publisher
            .publish(
                lifecycle::ORDER_SHIFTED,
                json!({
                    "document": parent,
                    "assignment": id,
                    "shifted": shifted,
                    "delta": delta,
                }),
            )
            .await
            .map_err(|e| OrderingError::EventPublishing(e.to_string()))?;

        Ok(ShiftSummary { shifted, delta })
    }

    /// The ordinal the acted-on assignment now occupies
    fn target_ordinal(&self, change: &RecordChange) -> Result<i64, OrderingError> {
        let id = change.id();
        let value = match change.post.field(fields::ORDER) {
            Some(value) => value,
            None => return Err(OrderingError::MissingOrder { id }),
        };
        let order = value
            .as_i64()
            .ok_or_else(|| OrderingError::InvalidOrdinal {
                id,
                value: value.to_string(),
            })?;
        if order < 0 {
            return Err(OrderingError::InvalidOrdinal {
                id,
                value: order.to_string(),
            });
        }
        Ok(order)
    }

    /// The ordinal the assignment held before this update
    fn previous_ordinal(&self, change: &RecordChange) -> Result<i64, OrderingError> {
        let id = change.id();
        let pre = change
            .pre
            .as_ref()
            .ok_or(OrderingError::MissingPreImage { id })?;
        let value = pre
            .field(fields::ORDER)
            .ok_or(OrderingError::PreImageMissingOrder { id })?;
        value.as_i64().ok_or_else(|| OrderingError::InvalidOrdinal {
            id,
            value: value.to_string(),
        })
    }

    /// Group key for the sibling set; updates that left the parent untouched
    /// fall back to the pre-image.
    fn parent_document(&self, change: &RecordChange) -> Result<Uuid, OrderingError> {
        change
            .post
            .uuid(fields::PARENT_DOCUMENT)
            .or_else(|| {
                change
                    .pre
                    .as_ref()
                    .and_then(|pre| pre.uuid(fields::PARENT_DOCUMENT))
            })
            .ok_or(OrderingError::MissingParent { id: change.id() })
    }
}

/// Live siblings of `parent` inside `window`, excluding the acted-on
/// assignment, sorted for deterministic batch application.
fn sibling_query(exclude: Uuid, parent: Uuid, window: ShiftWindow) -> Query {
    let range = match window {
        ShiftWindow::From(start) => Condition::ge(fields::ORDER, start),
        ShiftWindow::Between(start, end) => Condition::between(fields::ORDER, start, end),
    };

    Query::new()
        .and(Condition::ne(ID_FIELD, exclude.to_string()))
        .and(Condition::eq(fields::PARENT_DOCUMENT, parent.to_string()))
        .and(Condition::eq(fields::STATE, RecordState::Active.to_string()))
        .and(range)
        .order_by(fields::ORDER, SortDirection::Ascending)
        .order_by(fields::CREATED_AT, SortDirection::Ascending)
}
