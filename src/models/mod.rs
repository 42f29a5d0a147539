//! Typed views over generic record snapshots.
//!
//! Engines receive field-bag images from the trigger layer; these models
//! decode the fields they act on and surface contract violations as
//! [`SnapshotError`]s instead of panics or silent defaults.

pub mod document;
pub mod review_assignment;

pub use document::Document;
pub use review_assignment::ReviewAssignment;

use serde_json::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::store::record::{EntityType, Record};

/// A record image is missing or carries an unusable value for a field the
/// engine needs.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("{entity} image is missing required field '{field}'")]
    MissingField {
        entity: EntityType,
        field: &'static str,
    },

    #[error("Field '{field}' holds an invalid value: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

pub(crate) fn require_field<'a>(
    record: &'a Record,
    field: &'static str,
) -> Result<&'a Value, SnapshotError> {
    record.field(field).ok_or(SnapshotError::MissingField {
        entity: record.entity,
        field,
    })
}

pub(crate) fn require_uuid(record: &Record, field: &'static str) -> Result<Uuid, SnapshotError> {
    let value = require_field(record, field)?;
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| SnapshotError::InvalidValue {
            field,
            message: format!("expected a UUID, got {value}"),
        })
}

pub(crate) fn require_status<T>(record: &Record, field: &'static str) -> Result<T, SnapshotError>
where
    T: FromStr<Err = String>,
{
    let value = require_field(record, field)?;
    parse_status(value, field)
}

pub(crate) fn optional_status<T>(
    record: &Record,
    field: &'static str,
) -> Result<Option<T>, SnapshotError>
where
    T: FromStr<Err = String>,
{
    match record.field(field) {
        Some(value) => parse_status(value, field).map(Some),
        None => Ok(None),
    }
}

fn parse_status<T>(value: &Value, field: &'static str) -> Result<T, SnapshotError>
where
    T: FromStr<Err = String>,
{
    value
        .as_str()
        .ok_or_else(|| SnapshotError::InvalidValue {
            field,
            message: format!("expected a status string, got {value}"),
        })?
        .parse()
        .map_err(|message| SnapshotError::InvalidValue { field, message })
}
