//! Test data builders and change-image helpers shared by the integration
//! suites.

#![allow(dead_code)] // Each suite uses the slice of helpers it needs

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use docrouter_core::events::RecordChange;
use docrouter_core::models::document::fields as document_fields;
use docrouter_core::models::review_assignment::fields as assignment_fields;
use docrouter_core::models::{Document, ReviewAssignment};
use docrouter_core::state_machine::{
    DistributionStatus, RecordState, RoutingStatus, RoutingType, WorkflowStatus,
};
use docrouter_core::store::{EntityType, InMemoryRecordStore, Record};

/// Fixed base timestamp so assignment creation order is deterministic
fn base_timestamp() -> DateTime<Utc> {
    "2024-05-01T09:00:00Z".parse().unwrap()
}

/// Builder pattern for seeding test documents
pub struct DocumentBuilder {
    routing_status: RoutingStatus,
    workflow_status: WorkflowStatus,
    routing_type: Option<RoutingType>,
    owner: Uuid,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            routing_status: RoutingStatus::NotRouted,
            workflow_status: WorkflowStatus::NotStarted,
            routing_type: Some(RoutingType::Serial),
            owner: Uuid::new_v4(),
        }
    }

    pub fn with_routing_type(mut self, routing_type: RoutingType) -> Self {
        self.routing_type = Some(routing_type);
        self
    }

    pub fn without_routing_type(mut self) -> Self {
        self.routing_type = None;
        self
    }

    pub fn with_routing_status(mut self, status: RoutingStatus) -> Self {
        self.routing_status = status;
        self
    }

    pub fn with_workflow_status(mut self, status: WorkflowStatus) -> Self {
        self.workflow_status = status;
        self
    }

    pub fn with_owner(mut self, owner: Uuid) -> Self {
        self.owner = owner;
        self
    }

    pub fn build(self, store: &InMemoryRecordStore) -> Document {
        let document = Document {
            id: Uuid::new_v4(),
            routing_status: self.routing_status,
            workflow_status: self.workflow_status,
            routing_type: self.routing_type,
            owner: self.owner,
        };
        store.insert(document.to_record());
        document
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for seeding test review assignments
pub struct AssignmentBuilder {
    parent_document: Uuid,
    order: i64,
    distribution_status: DistributionStatus,
    reviewer: Uuid,
    state: RecordState,
}

impl AssignmentBuilder {
    pub fn new(parent_document: Uuid, order: i64) -> Self {
        Self {
            parent_document,
            order,
            distribution_status: DistributionStatus::NotStarted,
            reviewer: Uuid::new_v4(),
            state: RecordState::Active,
        }
    }

    pub fn with_status(mut self, status: DistributionStatus) -> Self {
        self.distribution_status = status;
        self
    }

    pub fn with_reviewer(mut self, reviewer: Uuid) -> Self {
        self.reviewer = reviewer;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.state = RecordState::Inactive;
        self
    }

    pub fn build(self, store: &InMemoryRecordStore) -> ReviewAssignment {
        // Stagger created_at by ordinal so the secondary sort key is stable
        let assignment = ReviewAssignment {
            id: Uuid::new_v4(),
            parent_document: self.parent_document,
            order: self.order,
            distribution_status: self.distribution_status,
            reviewer: self.reviewer,
            created_at: base_timestamp() + Duration::minutes(self.order),
            state: self.state,
        };
        store.insert(assignment.to_record());
        assignment
    }
}

/// Seed a document plus `count` not-started assignments ordered 0..count
pub fn seed_routing_plan(
    store: &InMemoryRecordStore,
    routing_type: RoutingType,
    count: i64,
) -> (Document, Vec<ReviewAssignment>) {
    let document = DocumentBuilder::new()
        .with_routing_type(routing_type)
        .build(store);
    let assignments = (0..count)
        .map(|order| AssignmentBuilder::new(document.id, order).build(store))
        .collect();
    (document, assignments)
}

pub fn store() -> Arc<InMemoryRecordStore> {
    Arc::new(InMemoryRecordStore::new())
}

/// Change image for a record created as currently stored
pub fn created_change(store: &InMemoryRecordStore, entity: EntityType, id: Uuid) -> RecordChange {
    RecordChange::created(store.snapshot(entity, id).expect("record must be seeded"))
}

/// Update change built from the stored snapshot: the closure edits the post
/// image, the store is updated to match, and the pre image is the snapshot
/// as it was.
pub fn updated_change(
    store: &InMemoryRecordStore,
    entity: EntityType,
    id: Uuid,
    edit: impl FnOnce(&mut Record),
) -> RecordChange {
    let pre = store.snapshot(entity, id).expect("record must be seeded");
    let mut post = pre.clone();
    edit(&mut post);
    store.insert(post.clone());
    RecordChange::updated(pre, post)
}

/// Change image for moving an assignment to a new ordinal
pub fn order_move(store: &InMemoryRecordStore, id: Uuid, new_order: i64) -> RecordChange {
    updated_change(store, EntityType::ReviewAssignment, id, |post| {
        post.set(assignment_fields::ORDER, new_order);
    })
}

/// Change image for a reviewer finishing their assignment
pub fn status_change(
    store: &InMemoryRecordStore,
    id: Uuid,
    status: DistributionStatus,
) -> RecordChange {
    updated_change(store, EntityType::ReviewAssignment, id, |post| {
        post.set(assignment_fields::DISTRIBUTION_STATUS, status.to_string());
    })
}

/// Change image for a document being routed for review
pub fn route_for_review(store: &InMemoryRecordStore, document: Uuid) -> RecordChange {
    updated_change(store, EntityType::Document, document, |post| {
        post.set(
            document_fields::ROUTING_STATUS,
            RoutingStatus::RoutedForReview.to_string(),
        );
        post.set(
            document_fields::WORKFLOW_STATUS,
            WorkflowStatus::InProgress.to_string(),
        );
    })
}

/// Current ordinal of a stored assignment
pub fn stored_order(store: &InMemoryRecordStore, id: Uuid) -> i64 {
    store
        .snapshot(EntityType::ReviewAssignment, id)
        .expect("assignment must exist")
        .int(assignment_fields::ORDER)
        .expect("assignment must carry an ordinal")
}

/// Current distribution status of a stored assignment
pub fn stored_status(store: &InMemoryRecordStore, id: Uuid) -> DistributionStatus {
    store
        .snapshot(EntityType::ReviewAssignment, id)
        .expect("assignment must exist")
        .text(assignment_fields::DISTRIBUTION_STATUS)
        .expect("assignment must carry a status")
        .parse()
        .expect("status must parse")
}

/// Current owner of a stored record
pub fn stored_owner(store: &InMemoryRecordStore, entity: EntityType, id: Uuid) -> Uuid {
    store
        .snapshot(entity, id)
        .expect("record must exist")
        .uuid("owner")
        .expect("record must carry an owner")
}

/// Parsed document view of the stored snapshot
pub fn stored_document(store: &InMemoryRecordStore, id: Uuid) -> Document {
    Document::from_record(
        &store
            .snapshot(EntityType::Document, id)
            .expect("document must exist"),
    )
    .expect("document must parse")
}
