//! Routing engines and the dispatcher that selects between them.
//!
//! Engines are plain structs over collaborator handles; the only way one
//! engine affects another is by writing records whose change notifications
//! the dispatcher later routes.

pub mod dispatcher;
pub mod ordering_engine;
pub mod routing_initializer;
pub mod serial_progress;
pub mod unit_of_work;

pub use dispatcher::{ChangeDispatcher, Dispatch, DispatchError};
pub use ordering_engine::{OrderingEngine, OrderingError, ShiftSummary};
pub use routing_initializer::{InitializationError, InitializationOutcome, RoutingInitializer};
pub use serial_progress::{ProgressError, ProgressOutcome, SerialProgressProcessor};
pub use unit_of_work::{InFlightRegistry, UnitOfWorkGuard};
