//! Counter configuration
//!
//! Loaded from `fold-counter.toml` in the current directory, falling back to
//! the user config directory:
//! - Linux: `~/.config/fold-counter/config.toml`
//! - macOS: `~/Library/Application Support/fold-counter/config.toml`
//! - Windows: `%APPDATA%\fold-counter\config.toml`

use fold_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "fold-counter";
const LOCAL_CONFIG_FILE: &str = "fold-counter.toml";

/// Counter configuration loaded from fold-counter.toml
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CounterConfig {
    /// Options passed to the store
    #[serde(default = "default_store")]
    pub store: StoreConfig,

    /// Initial count, also the value `Reset` returns to
    #[serde(default)]
    pub start: i64,

    /// Amount added by each `Add` in the scripted sequence
    #[serde(default = "default_step")]
    pub step: i64,

    /// Number of single `Increment` dispatches
    #[serde(default = "default_ticks")]
    pub ticks: u32,

    /// Clamp the count to `-limit..=limit` through the override hook
    #[serde(default)]
    pub limit: Option<i64>,

    /// Write the log to a timestamped file in this directory instead of stderr
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_store() -> StoreConfig {
    StoreConfig::named("counter")
}

fn default_step() -> i64 {
    5
}

fn default_ticks() -> u32 {
    3
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            start: 0,
            step: default_step(),
            ticks: default_ticks(),
            limit: None,
            log_dir: None,
        }
    }
}

/// Where the config came from, reported once logging is up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Invalid(PathBuf, String),
    Defaults,
}

impl CounterConfig {
    /// Load config from CWD first, then the config directory, or use defaults
    pub fn load() -> (Self, ConfigSource) {
        for path in config_paths() {
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            return match toml::from_str(&content) {
                Ok(config) => (config, ConfigSource::File(path)),
                Err(e) => (Self::default(), ConfigSource::Invalid(path, e.to_string())),
            };
        }

        (Self::default(), ConfigSource::Defaults)
    }
}

/// Candidate config files, in lookup order
fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join(APP_NAME).join("config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = CounterConfig::default();
        assert_eq!(config.store.name, "counter");
        assert_eq!(config.step, 5);
        assert_eq!(config.ticks, 3);
        assert!(config.limit.is_none());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            start = 10
            limit = 20

            [store]
            log_actions = true
        "#;
        let config: CounterConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.start, 10);
        assert_eq!(config.limit, Some(20));
        assert!(config.store.log_actions);
        // Fields missing from the [store] table use the store defaults
        assert_eq!(config.store.name, "store");
        assert!(config.store.recover_bus);
        // step should use default
        assert_eq!(config.step, 5);
    }

    #[test]
    fn test_local_file_is_looked_up_first() {
        let paths = config_paths();
        assert_eq!(paths[0], PathBuf::from("fold-counter.toml"));
    }
}
