//! Application configuration
//!
//! Provides layered configuration with:
//! - Runtime defaults
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Validation, including any category list that replaces the built-in one

use crate::registry::{CategoryConfig, CategoryRegistry};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Where usage exports are read from
    pub source: SourceConfig,

    /// Report output configuration
    pub display: DisplayConfig,

    /// Paths configuration
    pub paths: PathsConfig,

    /// Replaces the built-in categories when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory holding `monthly/<YYYYMMDD>-<category>.csv`
    pub data_dir: PathBuf,
    /// HTTP root serving the same layout; used with the `remote` feature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_items: usize,
    pub json_pretty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "ERROR".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            base_url: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_items: 100,
            json_pretty: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            source: SourceConfig::default(),
            display: DisplayConfig::default(),
            paths: PathsConfig::default(),
            categories: None,
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("billing-usage.toml"),
            PathBuf::from(".billing-usage.toml"),
            dirs::config_dir()
                .map(|d| d.join("billing-usage").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("BILLING_USAGE_DATA_DIR") {
            self.source.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("BILLING_USAGE_BASE_URL") {
            self.source.base_url = Some(val);
        }

        if let Ok(val) = env::var("BILLING_USAGE_MAX_ITEMS") {
            self.display.max_items = val.parse().context("Invalid BILLING_USAGE_MAX_ITEMS")?;
        }

        if let Ok(val) = env::var("BILLING_USAGE_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.display.max_items == 0 {
            return Err(anyhow::anyhow!("Display max_items must be greater than 0"));
        }

        if !matches!(self.logging.output.as_str(), "console" | "file" | "both") {
            warn!(
                output = %self.logging.output,
                "Unknown log output, falling back to console"
            );
        }

        if let Some(categories) = &self.categories {
            if categories.is_empty() {
                return Err(anyhow::anyhow!("Configured category list is empty"));
            }
            for category in categories {
                let validation = CategoryRegistry::validate(category);
                if !validation.is_valid() {
                    let reasons: Vec<String> = validation.errors.iter().map(|e| e.to_string()).collect();
                    return Err(anyhow::anyhow!(
                        "Invalid category '{}': {}",
                        category.id,
                        reasons.join(", ")
                    ));
                }
            }
        }

        if matches!(self.logging.output.as_str(), "file" | "both") && !self.paths.log_directory.exists() {
            fs::create_dir_all(&self.paths.log_directory).context("Failed to create log directory")?;
        }

        Ok(())
    }

    /// Registry seeded from the configured categories, or the built-in ones.
    pub fn category_registry(&self) -> CategoryRegistry {
        match &self.categories {
            Some(categories) => CategoryRegistry::with_configs(categories.clone()),
            None => CategoryRegistry::seeded(),
        }
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementKind;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "ERROR");
        assert_eq!(config.display.max_items, 100);
        assert_eq!(config.source.data_dir, PathBuf::from("data"));
        assert!(config.categories.is_none());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.display.max_items = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_category_rejected() {
        let mut config = Config::default();
        let mut broken = CategoryConfig::new("actions", "Actions", MeasurementKind::Time, "min")
            .with_free_quota(100.0);
        if let Some(quota) = broken.free_quota.as_mut() {
            quota.category = "storage".to_string();
        }
        config.categories = Some(vec![broken]);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid category 'actions'"));
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config: Config = toml::from_str("[display]\nmax_items = 10\n\n[logging]\nlevel = \"DEBUG\"\n").unwrap();
        assert_eq!(config.display.max_items, 10);
        assert!(config.display.json_pretty);
        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.logging.output, "console");
        assert_eq!(config.source.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_category_registry_from_config() {
        let mut config = Config::default();
        assert_eq!(config.category_registry().get_all().len(), 3);

        config.categories = Some(vec![CategoryConfig::new(
            "packages",
            "Packages",
            MeasurementKind::Capacity,
            "GB",
        )]);
        let registry = config.category_registry();
        assert_eq!(registry.category_ids(), vec!["packages"]);
    }
}
