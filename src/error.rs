use std::fmt;

/// Crate-level error for embedders that want one error surface instead of
/// the per-engine enums.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterError {
    StoreError(String),
    OrderingError(String),
    InitializationError(String),
    ProgressError(String),
    DispatchError(String),
    ValidationError(String),
    ConfigurationError(String),
    EventError(String),
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::StoreError(msg) => write!(f, "Store error: {msg}"),
            RouterError::OrderingError(msg) => write!(f, "Ordering error: {msg}"),
            RouterError::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            RouterError::ProgressError(msg) => write!(f, "Progress error: {msg}"),
            RouterError::DispatchError(msg) => write!(f, "Dispatch error: {msg}"),
            RouterError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            RouterError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            RouterError::EventError(msg) => write!(f, "Event error: {msg}"),
        }
    }
}

impl std::error::Error for RouterError {}

impl From<crate::store::StoreError> for RouterError {
    fn from(e: crate::store::StoreError) -> Self {
        RouterError::StoreError(e.to_string())
    }
}

impl From<crate::orchestration::OrderingError> for RouterError {
    fn from(e: crate::orchestration::OrderingError) -> Self {
        RouterError::OrderingError(e.to_string())
    }
}

impl From<crate::orchestration::InitializationError> for RouterError {
    fn from(e: crate::orchestration::InitializationError) -> Self {
        RouterError::InitializationError(e.to_string())
    }
}

impl From<crate::orchestration::ProgressError> for RouterError {
    fn from(e: crate::orchestration::ProgressError) -> Self {
        RouterError::ProgressError(e.to_string())
    }
}

impl From<crate::orchestration::DispatchError> for RouterError {
    fn from(e: crate::orchestration::DispatchError) -> Self {
        RouterError::DispatchError(e.to_string())
    }
}

impl From<crate::config::ConfigurationError> for RouterError {
    fn from(e: crate::config::ConfigurationError) -> Self {
        RouterError::ConfigurationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;
