//! Record store adapter seam.
//!
//! The routing core never talks to a database directly; every read and write
//! goes through the [`RecordStore`] trait. Embedders supply the adapter for
//! their platform; [`memory::InMemoryRecordStore`] is the reference
//! implementation used by the test suite.

pub mod memory;
pub mod query;
pub mod record;

pub use memory::InMemoryRecordStore;
pub use query::{Condition, Query, SortDirection, SortKey, ID_FIELD};
pub use record::{EntityType, Record, RecordPatch};

use async_trait::async_trait;
use uuid::Uuid;

/// Errors surfaced by a record store adapter
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityType, id: Uuid },

    #[error("Validation failed on field '{field}': {reason}")]
    FieldValidation { field: String, reason: String },

    #[error("Store backend failure during {operation} on {entity}: {message}")]
    Backend {
        operation: &'static str,
        entity: EntityType,
        message: String,
    },
}

/// Per-record failure inside a best-effort batch write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: Uuid,
    pub reason: String,
}

/// Outcome of a best-effort batch write. Batches are never atomic: each
/// record succeeds or fails independently and successes stay committed.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Render a failure list for aggregate error messages, naming every failed
/// record and its cause.
pub fn describe_failures(failed: &[BatchFailure]) -> String {
    failed
        .iter()
        .map(|f| format!("{} ({})", f.id, f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Narrow interface to the durable record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Filtered, sorted, optionally limited range read
    async fn find(&self, entity: EntityType, query: Query) -> Result<Vec<Record>, StoreError>;

    /// Point read. `fields` narrows the returned snapshot; an empty slice
    /// returns every field.
    async fn get(
        &self,
        entity: EntityType,
        id: Uuid,
        fields: &[&str],
    ) -> Result<Record, StoreError>;

    /// Single-record write
    async fn write_one(&self, patch: RecordPatch) -> Result<(), StoreError>;

    /// Best-effort multi-record write with per-record failure isolation
    async fn write_batch(&self, patches: Vec<RecordPatch>) -> Result<BatchOutcome, StoreError>;
}
