// Status enumerations for the routing domain.
//
// All statuses are closed enums with exhaustive matching; the host
// platform's magic option-set integers do not exist on this side of the
// boundary.

pub mod states;

pub use states::{
    DistributionStatus, RecordState, RoutingStatus, RoutingType, WorkflowStatus,
};
