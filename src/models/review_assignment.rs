use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::state_machine::{DistributionStatus, RecordState};
use crate::store::record::{EntityType, Record};

use super::{optional_status, require_field, require_status, require_uuid, SnapshotError};

/// Field names on a review assignment record
pub mod fields {
    pub const PARENT_DOCUMENT: &str = "parent_document";
    pub const ORDER: &str = "order";
    pub const DISTRIBUTION_STATUS: &str = "distribution_status";
    pub const REVIEWER: &str = "reviewer";
    pub const CREATED_AT: &str = "created_at";
    pub const OWNER: &str = "owner";
    pub const STATE: &str = "state";
}

/// Typed view of a review assignment image: one reviewer's slot in a
/// document's routing cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewAssignment {
    pub id: Uuid,
    pub parent_document: Uuid,
    pub order: i64,
    pub distribution_status: DistributionStatus,
    pub reviewer: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: RecordState,
}

impl ReviewAssignment {
    pub fn from_record(record: &Record) -> Result<Self, SnapshotError> {
        let order_value = require_field(record, fields::ORDER)?;
        let order = order_value
            .as_i64()
            .ok_or_else(|| SnapshotError::InvalidValue {
                field: fields::ORDER,
                message: format!("expected an integer ordinal, got {order_value}"),
            })?;
        if order < 0 {
            return Err(SnapshotError::InvalidValue {
                field: fields::ORDER,
                message: format!("ordinal must be non-negative, got {order}"),
            });
        }

        let created_at = record
            .timestamp(fields::CREATED_AT)
            .ok_or(SnapshotError::MissingField {
                entity: record.entity,
                field: fields::CREATED_AT,
            })?;

        Ok(Self {
            id: record.id,
            parent_document: require_uuid(record, fields::PARENT_DOCUMENT)?,
            order,
            distribution_status: require_status(record, fields::DISTRIBUTION_STATUS)?,
            reviewer: require_uuid(record, fields::REVIEWER)?,
            created_at,
            state: optional_status(record, fields::STATE)?.unwrap_or_default(),
        })
    }

    /// Full record snapshot for this view; used by embedders seeding stores.
    pub fn to_record(&self) -> Record {
        Record::new(EntityType::ReviewAssignment, self.id)
            .with_field(fields::PARENT_DOCUMENT, self.parent_document.to_string())
            .with_field(fields::ORDER, self.order)
            .with_field(
                fields::DISTRIBUTION_STATUS,
                self.distribution_status.to_string(),
            )
            .with_field(fields::REVIEWER, self.reviewer.to_string())
            .with_field(
                fields::CREATED_AT,
                self.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .with_field(fields::STATE, self.state.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment() -> ReviewAssignment {
        ReviewAssignment {
            id: Uuid::new_v4(),
            parent_document: Uuid::new_v4(),
            order: 2,
            distribution_status: DistributionStatus::NotStarted,
            reviewer: Uuid::new_v4(),
            created_at: "2024-05-01T09:30:00Z".parse().unwrap(),
            state: RecordState::Active,
        }
    }

    #[test]
    fn test_round_trip() {
        let assignment = assignment();
        let parsed = ReviewAssignment::from_record(&assignment.to_record()).unwrap();
        assert_eq!(parsed, assignment);
    }

    #[test]
    fn test_negative_ordinal_is_rejected() {
        let mut record = assignment().to_record();
        record.set(fields::ORDER, -1);

        let err = ReviewAssignment::from_record(&record).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InvalidValue {
                field: fields::ORDER,
                ..
            }
        ));
    }

    #[test]
    fn test_fractional_ordinal_is_rejected() {
        let mut record = assignment().to_record();
        record.set(fields::ORDER, serde_json::json!(1.5));

        let err = ReviewAssignment::from_record(&record).unwrap_err();
        assert!(matches!(err, SnapshotError::InvalidValue { .. }));
    }

    #[test]
    fn test_state_defaults_to_active() {
        let mut record = assignment().to_record();
        record.fields.remove(fields::STATE);

        let parsed = ReviewAssignment::from_record(&record).unwrap();
        assert_eq!(parsed.state, RecordState::Active);
    }
}
