// Change images delivered by the trigger layer, plus the broadcast
// publisher engines use for lifecycle observability events.

pub mod change;
pub mod publisher;

pub use change::{ChangeKind, RecordChange};
pub use publisher::{EventPublisher, PublishError, PublishedEvent};
