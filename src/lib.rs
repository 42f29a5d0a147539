#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # DocRouter Core
//!
//! Rust core of a document review-routing engine: orders reviewer
//! assignments and drives them through a parallel or serial approval
//! workflow, reacting to record-change notifications delivered by a host
//! trigger layer.
//!
//! ## Architecture
//!
//! Three engines share one narrow seam to the durable record store:
//!
//! - the **ordering engine** keeps sibling assignments' ordinals
//!   duplicate-free across inserts and moves,
//! - the **routing initializer** fans out to every reviewer (parallel) or
//!   activates the first (serial) when a document enters review,
//! - the **serial progress processor** advances the chain as reviewers
//!   complete, finalizing or terminating the document at the boundary.
//!
//! Engines never call each other; cross-engine effects travel through
//! record writes the [`orchestration::ChangeDispatcher`] routes on a later
//! delivery. Internal engine writes are marked and dropped at dispatch, and
//! document-scoped invocations hold a unit-of-work guard against nested
//! re-entry.
//!
//! ## Module Organization
//!
//! - [`store`] - Record store adapter seam, query model, in-memory reference store
//! - [`models`] - Typed document and review assignment views over record images
//! - [`state_machine`] - Closed status enumerations for the routing domain
//! - [`events`] - Change images and the lifecycle event publisher
//! - [`orchestration`] - The three engines, dispatcher, and re-entrancy guard
//! - [`config`] - Environment-aware configuration and policy knobs
//! - [`error`] - Crate-level error surface
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use docrouter_core::orchestration::ChangeDispatcher;
//! use docrouter_core::store::InMemoryRecordStore;
//!
//! let store = Arc::new(InMemoryRecordStore::new());
//! let dispatcher = ChangeDispatcher::new(store);
//! // Feed dispatcher.on_record_changed(..) from your trigger layer.
//! # let _ = dispatcher;
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod store;

pub use error::{Result, RouterError};
pub use events::{ChangeKind, EventPublisher, RecordChange};
pub use orchestration::{ChangeDispatcher, Dispatch};
pub use state_machine::{
    DistributionStatus, RecordState, RoutingStatus, RoutingType, WorkflowStatus,
};
pub use store::{EntityType, Record, RecordPatch, RecordStore};
