//! # Change Dispatcher
//!
//! Entry point for the trigger layer: routes each record change to exactly
//! one engine, selected by which entity and field changed. Internal-marked
//! changes are dropped here, and document-scoped invocations run under the
//! unit-of-work guard so a cascade cannot re-enter an engine for the same
//! document.

use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::RouterConfig;
use crate::events::{ChangeKind, EventPublisher, RecordChange};
use crate::models::document::fields as document_fields;
use crate::models::review_assignment::fields as assignment_fields;
use crate::state_machine::RoutingStatus;
use crate::store::{EntityType, RecordStore};

use super::ordering_engine::{OrderingEngine, OrderingError, ShiftSummary};
use super::routing_initializer::{
    InitializationError, InitializationOutcome, RoutingInitializer,
};
use super::serial_progress::{ProgressError, ProgressOutcome, SerialProgressProcessor};
use super::unit_of_work::InFlightRegistry;

/// How the dispatcher resolved one change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Internal engine write; never routed
    Dropped,
    /// No engine reacts to this entity/field combination
    Skipped,
    /// A nested delivery for an in-flight document was refused
    Suppressed { document: Uuid },
    Ordered(ShiftSummary),
    Initialized(InitializationOutcome),
    Progressed(ProgressOutcome),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Update notification for {entity} {id} arrived without a pre-image")]
    MissingPreImage { entity: EntityType, id: Uuid },

    #[error("Assignment {id} was created without an ordinal")]
    MissingOrderOnCreate { id: Uuid },

    #[error("Routing type of document {document} cannot change during an active cycle")]
    RoutingTypeChangeRejected { document: Uuid },

    #[error(transparent)]
    Ordering(#[from] OrderingError),

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Synchronous router from change notifications to engine invocations
pub struct ChangeDispatcher {
    ordering: OrderingEngine,
    initializer: RoutingInitializer,
    progress: SerialProgressProcessor,
    in_flight: InFlightRegistry,
}

impl ChangeDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_publisher(store, EventPublisher::default())
    }

    pub fn with_publisher(store: Arc<dyn RecordStore>, publisher: EventPublisher) -> Self {
        Self {
            ordering: OrderingEngine::with_publisher(Arc::clone(&store), publisher.clone()),
            initializer: RoutingInitializer::with_publisher(Arc::clone(&store), publisher.clone()),
            progress: SerialProgressProcessor::with_publisher(store, publisher),
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Build a dispatcher honoring the loaded configuration
    pub fn from_config(store: Arc<dyn RecordStore>, config: &RouterConfig) -> Self {
        let publisher = EventPublisher::new(config.events.capacity);
        Self {
            ordering: OrderingEngine::with_publisher(Arc::clone(&store), publisher.clone()),
            initializer: RoutingInitializer::with_publisher(Arc::clone(&store), publisher.clone()),
            progress: SerialProgressProcessor::with_components(
                store,
                publisher,
                config.rejection.policy,
            ),
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Assemble from pre-built components
    pub fn with_components(
        ordering: OrderingEngine,
        initializer: RoutingInitializer,
        progress: SerialProgressProcessor,
        in_flight: InFlightRegistry,
    ) -> Self {
        Self {
            ordering,
            initializer,
            progress,
            in_flight,
        }
    }

    /// The in-flight registry guarding document-scoped invocations
    pub fn in_flight(&self) -> &InFlightRegistry {
        &self.in_flight
    }

    /// Route one change notification to the engine it belongs to.
    #[instrument(skip(self, change), fields(entity = %change.entity(), kind = %change.kind, id = %change.id()))]
    pub async fn on_record_changed(&self, change: RecordChange) -> Result<Dispatch, DispatchError> {
        if change.internal {
            debug!("Dropping internal engine write");
            return Ok(Dispatch::Dropped);
        }

        if change.kind == ChangeKind::Update && change.pre.is_none() {
            return Err(DispatchError::MissingPreImage {
                entity: change.entity(),
                id: change.id(),
            });
        }

        match change.entity() {
            EntityType::ReviewAssignment => self.route_assignment(change).await,
            EntityType::Document => self.route_document(change).await,
        }
    }

    async fn route_assignment(&self, change: RecordChange) -> Result<Dispatch, DispatchError> {
        match change.kind {
            ChangeKind::Create => {
                if !change.post.has_field(assignment_fields::ORDER) {
                    return Err(DispatchError::MissingOrderOnCreate { id: change.id() });
                }
                let summary = self.ordering.handle(&change).await?;
                Ok(Dispatch::Ordered(summary))
            }
            ChangeKind::Update => {
                // An update touching both fields is an ordering concern
                // first; the status machine reacts to its own delivery.
                if change.field_changed(assignment_fields::ORDER) {
                    let summary = self.ordering.handle(&change).await?;
                    return Ok(Dispatch::Ordered(summary));
                }
                if change.field_changed(assignment_fields::DISTRIBUTION_STATUS) {
                    let document = change
                        .post
                        .uuid(assignment_fields::PARENT_DOCUMENT)
                        .or_else(|| {
                            change
                                .pre
                                .as_ref()
                                .and_then(|pre| pre.uuid(assignment_fields::PARENT_DOCUMENT))
                        });

                    let Some(document) = document else {
                        // The engine owns the missing-parent contract error
                        let outcome = self.progress.handle(&change).await?;
                        return Ok(Dispatch::Progressed(outcome));
                    };

                    let Some(_guard) = self.in_flight.try_enter(document) else {
                        warn!(%document, "Suppressed nested invocation for in-flight document");
                        return Ok(Dispatch::Suppressed { document });
                    };
                    let outcome = self.progress.handle(&change).await?;
                    return Ok(Dispatch::Progressed(outcome));
                }
                debug!("Assignment update touched no routed field");
                Ok(Dispatch::Skipped)
            }
        }
    }

    async fn route_document(&self, change: RecordChange) -> Result<Dispatch, DispatchError> {
        if change.kind != ChangeKind::Update {
            return Ok(Dispatch::Skipped);
        }

        self.reject_mid_cycle_retype(&change)?;

        let document = change.id();
        let Some(_guard) = self.in_flight.try_enter(document) else {
            warn!(%document, "Suppressed nested invocation for in-flight document");
            return Ok(Dispatch::Suppressed { document });
        };
        let outcome = self.initializer.handle(&change).await?;
        Ok(Dispatch::Initialized(outcome))
    }

    /// Routing type is fixed once a cycle starts; a mid-cycle change is a
    /// caller error, not something to silently absorb.
    fn reject_mid_cycle_retype(&self, change: &RecordChange) -> Result<(), DispatchError> {
        if !change.field_changed(document_fields::ROUTING_TYPE) {
            return Ok(());
        }
        let cycle_active = change
            .pre
            .as_ref()
            .and_then(|pre| pre.text(document_fields::ROUTING_STATUS))
            .and_then(|s| s.parse::<RoutingStatus>().ok())
            .is_some_and(|status| status.is_cycle_active());

        if cycle_active {
            return Err(DispatchError::RoutingTypeChangeRejected {
                document: change.id(),
            });
        }
        Ok(())
    }
}
