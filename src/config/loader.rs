//! Configuration Loader
//!
//! Environment-aware YAML loading: a base `docrouter.yaml` merged with an
//! optional `docrouter.{environment}.yaml` overlay, then validated. Missing
//! files fall back to defaults so embedders can run configuration-free.

use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::RouterConfig;

const BASE_FILE: &str = "docrouter.yaml";

/// Loaded configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: RouterConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with an explicit
    /// environment. Useful for tests that must not touch process env vars.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment,
            directory = %config_directory.display(),
            "Loading router configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn detect_environment() -> String {
        env::var("DOCROUTER_ENV").unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("DOCROUTER_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn load_and_merge_config(directory: &Path, environment: &str) -> ConfigResult<RouterConfig> {
        let base_path = directory.join(BASE_FILE);
        let overlay_path = directory.join(format!("docrouter.{environment}.yaml"));

        let mut merged = match Self::read_yaml(&base_path)? {
            Some(base) => base,
            None => {
                debug!(path = %base_path.display(), "No base config file; using defaults");
                YamlValue::Mapping(Default::default())
            }
        };

        if let Some(overlay) = Self::read_yaml(&overlay_path)? {
            merge_yaml(&mut merged, overlay);
        }

        serde_yaml::from_value(merged).map_err(|source| ConfigurationError::Parse {
            path: base_path,
            source,
        })
    }

    fn read_yaml(path: &Path) -> ConfigResult<Option<YamlValue>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let value = serde_yaml::from_str(&raw).map_err(|source| ConfigurationError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(value))
    }
}

/// Deep-merge `overlay` into `base`; overlay scalars win, mappings recurse.
fn merge_yaml(base: &mut YamlValue, overlay: YamlValue) {
    match (base, overlay) {
        (YamlValue::Mapping(base_map), YamlValue::Mapping(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(&key) {
                    merge_yaml(base_value, overlay_value);
                    continue;
                }
                base_map.insert(key, overlay_value);
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}
