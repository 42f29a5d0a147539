use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::store::record::{EntityType, Record};

/// Kind of write that produced a change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Create,
    Update,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
        }
    }
}

/// A change notification delivered by the trigger layer.
///
/// Carries the post-write snapshot and, for updates, the pre-write snapshot.
/// The `internal` flag mirrors [`RecordPatch::mark_internal`](crate::store::RecordPatch::mark_internal):
/// changes produced by internal engine writes are dropped at dispatch instead
/// of being routed back into an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChange {
    pub kind: ChangeKind,
    pub post: Record,
    pub pre: Option<Record>,
    pub internal: bool,
}

impl RecordChange {
    pub fn created(post: Record) -> Self {
        Self {
            kind: ChangeKind::Create,
            post,
            pre: None,
            internal: false,
        }
    }

    pub fn updated(pre: Record, post: Record) -> Self {
        Self {
            kind: ChangeKind::Update,
            post,
            pre: Some(pre),
            internal: false,
        }
    }

    pub fn mark_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    pub fn entity(&self) -> EntityType {
        self.post.entity
    }

    pub fn id(&self) -> Uuid {
        self.post.id
    }

    /// Whether `field` differs between the pre and post images. A create
    /// counts as changing every field present on the post image.
    pub fn field_changed(&self, field: &str) -> bool {
        match (&self.pre, self.kind) {
            (_, ChangeKind::Create) => self.post.has_field(field),
            (Some(pre), ChangeKind::Update) => pre.field(field) != self.post.field(field),
            (None, ChangeKind::Update) => self.post.has_field(field),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(order: i64) -> Record {
        Record::new(EntityType::ReviewAssignment, Uuid::new_v4()).with_field("order", order)
    }

    #[test]
    fn test_create_changes_present_fields() {
        let change = RecordChange::created(record(1));
        assert!(change.field_changed("order"));
        assert!(!change.field_changed("distribution_status"));
    }

    #[test]
    fn test_update_detects_field_delta() {
        let pre = record(1);
        let mut post = pre.clone();
        post.set("order", 4);

        let change = RecordChange::updated(pre.clone(), post);
        assert!(change.field_changed("order"));

        let unchanged = RecordChange::updated(pre.clone(), pre);
        assert!(!unchanged.field_changed("order"));
    }
}
