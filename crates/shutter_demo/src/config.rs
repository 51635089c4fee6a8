//! Configuration management for the shutter demo.
//!
//! The demo reads a TOML file describing the components to simulate, how they
//! are bound together, and which one fails first.

use crate::error::DemoError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

fn default_trigger_after_ms() -> u64 {
    200
}

fn default_cleanup_ms() -> u64 {
    25
}

fn default_workers() -> usize {
    1
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration settings
    pub logging: LoggingSettings,
    /// Which component goes down, when, and why
    pub scenario: ScenarioSettings,
    /// Components to simulate, each with its own shutter
    #[serde(default)]
    pub components: Vec<ComponentSettings>,
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

/// The shutdown scenario to play out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSettings {
    /// Name of the component whose shutter is shut down first
    pub trigger: String,
    /// Delay before the trigger fires, in milliseconds
    #[serde(default = "default_trigger_after_ms")]
    pub trigger_after_ms: u64,
    /// Cause passed to the shutdown; absent means a clean shutdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// One simulated component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentSettings {
    /// Unique component name
    pub name: String,
    /// Name of another component to bind this one to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// How long the terminating callback takes, in milliseconds
    #[serde(default = "default_cleanup_ms")]
    pub cleanup_ms: u64,
    /// Number of background workers started through `locked_init`
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ComponentSettings {
    fn new(name: &str, bind: Option<&str>, cleanup_ms: u64, workers: usize) -> Self {
        Self {
            name: name.to_string(),
            bind: bind.map(str::to_string),
            cleanup_ms,
            workers,
        }
    }
}

/// Anything listed by component name.
pub(crate) trait Named {
    fn name(&self) -> &str;
}

impl Named for ComponentSettings {
    fn name(&self) -> &str {
        &self.name
    }
}

/// First entry of `items` called `name`.
pub(crate) fn find_named<'a, T: Named>(items: &'a [T], name: &str) -> Option<&'a T> {
    items.iter().find(|item| item.name() == name)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
            scenario: ScenarioSettings {
                trigger: "storage".to_string(),
                trigger_after_ms: default_trigger_after_ms(),
                cause: Some("storage backend unreachable".to_string()),
            },
            components: vec![
                ComponentSettings::new("gateway", None, 30, 2),
                ComponentSettings::new("storage", Some("gateway"), 50, 1),
                ComponentSettings::new("indexer", Some("storage"), 20, 2),
                ComponentSettings::new("metrics", None, 10, 1),
            ],
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing the default configuration
    /// there first if the file does not exist.
    pub async fn load_from_file(path: &Path) -> Result<Self, DemoError> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Looks up a component by name.
    pub fn component(&self, name: &str) -> Option<&ComponentSettings> {
        find_named(&self.components, name)
    }

    /// Checks the configuration for inconsistencies.
    pub fn validate(&self) -> Result<(), String> {
        if self.components.is_empty() {
            return Err("At least one component must be configured".to_string());
        }

        let mut names = HashSet::new();
        for component in &self.components {
            if component.name.trim().is_empty() {
                return Err("Component name cannot be empty".to_string());
            }
            if !names.insert(component.name.as_str()) {
                return Err(format!("Duplicate component name: {}", component.name));
            }
        }

        for component in &self.components {
            if let Some(bind) = &component.bind {
                if bind == &component.name {
                    return Err(format!("Component {} cannot bind to itself", component.name));
                }
                if !names.contains(bind.as_str()) {
                    return Err(format!(
                        "Component {} binds to unknown component: {bind}",
                        component.name
                    ));
                }
            }
        }

        if !names.contains(self.scenario.trigger.as_str()) {
            return Err(format!(
                "Scenario trigger is not a configured component: {}",
                self.scenario.trigger
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.components.len(), 4);
        assert_eq!(
            config.component("indexer").and_then(|c| c.bind.as_deref()),
            Some("storage")
        );
    }

    #[test]
    fn test_find_named_returns_first_match() {
        let components = vec![
            ComponentSettings::new("gateway", None, 5, 1),
            ComponentSettings::new("storage", Some("gateway"), 5, 1),
            ComponentSettings::new("storage", None, 5, 1),
        ];
        let storage = find_named(&components, "storage").unwrap();
        assert_eq!(storage.bind.as_deref(), Some("gateway"));
        assert!(find_named(&components, "ghost").is_none());
    }

    #[test]
    fn test_validation_rejects_empty_components() {
        let mut config = AppConfig::default();
        config.components.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_names() {
        let mut config = AppConfig::default();
        config.components.push(ComponentSettings::new("gateway", None, 1, 1));
        let err = config.validate().unwrap_err();
        assert!(err.contains("Duplicate"));
    }

    #[test]
    fn test_validation_rejects_bad_bindings() {
        let mut config = AppConfig::default();
        config.components[0].bind = Some("gateway".to_string());
        assert!(config.validate().unwrap_err().contains("itself"));

        config.components[0].bind = Some("nowhere".to_string());
        assert!(config.validate().unwrap_err().contains("unknown component"));
    }

    #[test]
    fn test_validation_rejects_unknown_trigger() {
        let mut config = AppConfig::default();
        config.scenario.trigger = "ghost".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        for level in ["trace", "debug", "info", "warn", "error"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "{level} should be accepted");
        }
    }

    #[test]
    fn test_serde_defaults() {
        let toml_str = r#"
            [logging]
            level = "debug"

            [scenario]
            trigger = "solo"

            [[components]]
            name = "solo"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.logging.json_format);
        assert_eq!(config.scenario.trigger_after_ms, 200);
        assert!(config.scenario.cause.is_none());

        let solo = config.component("solo").unwrap();
        assert!(solo.bind.is_none());
        assert_eq!(solo.cleanup_ms, 25);
        assert_eq!(solo.workers, 1);
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file_writes_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shutter.toml");

        let config = AppConfig::load_from_file(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.scenario.trigger, "storage");

        let reloaded = AppConfig::load_from_file(&path).await.unwrap();
        assert_eq!(reloaded.components.len(), config.components.len());
        assert_eq!(reloaded.scenario.cause, config.scenario.cause);
        assert_eq!(
            reloaded.component("storage").and_then(|c| c.bind.clone()),
            Some("gateway".to_string())
        );
    }

    #[tokio::test]
    async fn test_load_from_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        tokio::fs::write(&path, "[logging\nlevel = ").await.unwrap();

        let result = AppConfig::load_from_file(&path).await;
        assert!(matches!(result, Err(DemoError::ConfigParse(_))));
    }
}
