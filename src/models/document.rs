use uuid::Uuid;

use crate::state_machine::{RoutingStatus, RoutingType, WorkflowStatus};
use crate::store::record::{EntityType, Record};

use super::{optional_status, require_status, require_uuid, SnapshotError};

/// Field names on a document record
pub mod fields {
    pub const ROUTING_STATUS: &str = "routing_status";
    pub const ROUTING_TYPE: &str = "routing_type";
    pub const WORKFLOW_STATUS: &str = "workflow_status";
    pub const OWNER: &str = "owner";
}

/// Typed view of a document image: the routing parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub routing_status: RoutingStatus,
    pub workflow_status: WorkflowStatus,
    /// Absent until the initiator picks one; required to start a cycle
    pub routing_type: Option<RoutingType>,
    pub owner: Uuid,
}

impl Document {
    pub fn from_record(record: &Record) -> Result<Self, SnapshotError> {
        Ok(Self {
            id: record.id,
            routing_status: require_status(record, fields::ROUTING_STATUS)?,
            workflow_status: require_status(record, fields::WORKFLOW_STATUS)?,
            routing_type: optional_status(record, fields::ROUTING_TYPE)?,
            owner: require_uuid(record, fields::OWNER)?,
        })
    }

    /// Full record snapshot for this view; used by embedders seeding stores.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new(EntityType::Document, self.id)
            .with_field(fields::ROUTING_STATUS, self.routing_status.to_string())
            .with_field(fields::WORKFLOW_STATUS, self.workflow_status.to_string())
            .with_field(fields::OWNER, self.owner.to_string());
        if let Some(routing_type) = self.routing_type {
            record.set(fields::ROUTING_TYPE, routing_type.to_string());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let document = Document {
            id: Uuid::new_v4(),
            routing_status: RoutingStatus::RoutedForReview,
            workflow_status: WorkflowStatus::InProgress,
            routing_type: Some(RoutingType::Serial),
            owner: Uuid::new_v4(),
        };

        let parsed = Document::from_record(&document.to_record()).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_missing_owner_is_rejected() {
        let mut record = Document {
            id: Uuid::new_v4(),
            routing_status: RoutingStatus::NotRouted,
            workflow_status: WorkflowStatus::NotStarted,
            routing_type: None,
            owner: Uuid::new_v4(),
        }
        .to_record();
        record.fields.remove(fields::OWNER);

        let err = Document::from_record(&record).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::MissingField {
                field: fields::OWNER,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let record = Record::new(EntityType::Document, Uuid::new_v4())
            .with_field(fields::ROUTING_STATUS, "routed_to_the_moon")
            .with_field(fields::WORKFLOW_STATUS, "not_started")
            .with_field(fields::OWNER, Uuid::new_v4().to_string());

        let err = Document::from_record(&record).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidValue { .. }));
    }
}
