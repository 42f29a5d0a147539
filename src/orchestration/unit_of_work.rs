//! Re-entrancy guard scoped to one logical unit of work.
//!
//! An engine invocation for a document holds a guard for its whole duration;
//! nested deliveries for the same document (a direct self-trigger or a
//! cascade caused by the invocation's own writes) are refused while the
//! guard is held. The guard releases on drop, so every exit path — including
//! errors — clears the marker.

use dashmap::DashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Set of documents with an engine invocation currently in flight
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<DashSet<Uuid>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the unit-of-work marker for a document. Returns `None` when an
    /// invocation for that document is already in flight.
    pub fn try_enter(&self, document: Uuid) -> Option<UnitOfWorkGuard> {
        if self.active.insert(document) {
            Some(UnitOfWorkGuard {
                active: Arc::clone(&self.active),
                document,
            })
        } else {
            None
        }
    }

    pub fn is_in_flight(&self, document: Uuid) -> bool {
        self.active.contains(&document)
    }
}

/// RAII marker for one logical unit of work over a document
#[derive(Debug)]
pub struct UnitOfWorkGuard {
    active: Arc<DashSet<Uuid>>,
    document: Uuid,
}

impl UnitOfWorkGuard {
    pub fn document(&self) -> Uuid {
        self.document
    }
}

impl Drop for UnitOfWorkGuard {
    fn drop(&mut self) {
        self.active.remove(&self.document);
    }
}
