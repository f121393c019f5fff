//! Store configuration
//!
//! Usually embedded as a `[store]` table in an application's TOML config.
//! Every field is optional.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime options for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Label used in log lines (several stores can share one log)
    #[serde(default = "default_name")]
    pub name: String,

    /// Register a `LoggingMiddleware` ahead of all other middleware
    #[serde(default)]
    pub log_actions: bool,

    /// Reopen the action channel once when a publish finds it closed
    #[serde(default = "default_recover_bus")]
    pub recover_bus: bool,
}

fn default_name() -> String {
    "store".to_string()
}

fn default_recover_bus() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_actions: false,
            recover_bus: default_recover_bus(),
        }
    }
}

impl StoreConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, StoreError> {
        toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded store config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.name, "store");
        assert!(!config.log_actions);
        assert!(config.recover_bus);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(StoreConfig::from_toml_str("").unwrap(), StoreConfig::default());
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            name = "checkout"
            log_actions = true
        "#;
        let config = StoreConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.name, "checkout");
        assert!(config.log_actions);
        // recover_bus should use default
        assert!(config.recover_bus);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let err = StoreConfig::from_toml_str("log_actions = \"yes\"").unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = StoreConfig::load("/nonexistent/fold-store.toml").unwrap_err();
        match err {
            StoreError::Config(message) => assert!(message.contains("/nonexistent/fold-store.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
