//! In-memory reference implementation of [`RecordStore`].
//!
//! Used by the test suite in place of a real platform adapter. Tracks every
//! applied patch and supports per-record failure injection so partial batch
//! outcomes can be exercised deterministically.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use async_trait::async_trait;

use super::query::Query;
use super::record::{EntityType, Record, RecordPatch};
use super::{BatchFailure, BatchOutcome, RecordStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<(EntityType, Uuid), Record>,
    /// Ids whose next write should fail (failure injection)
    failing_writes: HashSet<Uuid>,
    /// Every patch applied, in application order
    write_log: Vec<RecordPatch>,
}

/// Thread-safe in-memory record store
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, replacing any existing one with the same identity
    pub fn insert(&self, record: Record) {
        let mut state = self.state.lock();
        state.records.insert((record.entity, record.id), record);
    }

    /// Current snapshot of a record, if present
    pub fn snapshot(&self, entity: EntityType, id: Uuid) -> Option<Record> {
        self.state.lock().records.get(&(entity, id)).cloned()
    }

    /// Make the next write against `id` fail with a backend error
    pub fn fail_writes_for(&self, id: Uuid) {
        self.state.lock().failing_writes.insert(id);
    }

    /// Patches applied so far, in order
    pub fn write_log(&self) -> Vec<RecordPatch> {
        self.state.lock().write_log.clone()
    }

    pub fn clear_write_log(&self) {
        self.state.lock().write_log.clear();
    }

    fn apply(state: &mut MemoryState, patch: &RecordPatch) -> Result<(), StoreError> {
        if state.failing_writes.remove(&patch.id) {
            return Err(StoreError::Backend {
                operation: "write",
                entity: patch.entity,
                message: format!("injected failure for {}", patch.id),
            });
        }
        let record = state
            .records
            .get_mut(&(patch.entity, patch.id))
            .ok_or(StoreError::NotFound {
                entity: patch.entity,
                id: patch.id,
            })?;
        patch.apply_to(record);
        state.write_log.push(patch.clone());
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find(&self, entity: EntityType, query: Query) -> Result<Vec<Record>, StoreError> {
        let state = self.state.lock();
        let mut results: Vec<Record> = state
            .records
            .values()
            .filter(|r| r.entity == entity && query.matches(r))
            .cloned()
            .collect();
        drop(state);

        query.sort_records(&mut results);
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    async fn get(
        &self,
        entity: EntityType,
        id: Uuid,
        fields: &[&str],
    ) -> Result<Record, StoreError> {
        let state = self.state.lock();
        let record = state
            .records
            .get(&(entity, id))
            .cloned()
            .ok_or(StoreError::NotFound { entity, id })?;

        if fields.is_empty() {
            return Ok(record);
        }
        let mut narrowed = Record::new(entity, id);
        for name in fields {
            if let Some(value) = record.field(name) {
                narrowed.set(*name, value.clone());
            }
        }
        Ok(narrowed)
    }

    async fn write_one(&self, patch: RecordPatch) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        Self::apply(&mut state, &patch)
    }

    async fn write_batch(&self, patches: Vec<RecordPatch>) -> Result<BatchOutcome, StoreError> {
        let mut state = self.state.lock();
        let mut outcome = BatchOutcome::default();
        for patch in &patches {
            match Self::apply(&mut state, patch) {
                Ok(()) => outcome.succeeded.push(patch.id),
                Err(e) => outcome.failed.push(BatchFailure {
                    id: patch.id,
                    reason: e.to_string(),
                }),
            }
        }
        Ok(outcome)
    }
}
