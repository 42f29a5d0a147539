//! # Router Configuration
//!
//! Environment-aware YAML configuration for the routing core. Policy
//! decisions that the engines must not guess at — notably what happens to
//! outstanding assignments on rejection — live here as explicit, validated
//! settings instead of hardcoded behavior.

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use serde::{Deserialize, Serialize};

/// What to do with not-yet-started assignments when a reviewer rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
    /// Leave outstanding assignments untouched (observed upstream behavior)
    #[default]
    LeaveOutstanding,
    /// Close outstanding assignments out alongside the rejection
    CancelOutstanding,
}

/// Rejection handling settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RejectionConfig {
    pub policy: RejectionPolicy,
}

/// Lifecycle event channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Broadcast channel capacity for lifecycle events
    pub capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Root configuration structure mirroring docrouter.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub rejection: RejectionConfig,
    pub events: EventConfig,
}

impl RouterConfig {
    /// Reject configurations the engines cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.events.capacity == 0 {
            return Err(ConfigurationError::Invalid {
                message: "events.capacity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
