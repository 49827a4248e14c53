//! Configuration manager
//!
//! Layers built-in defaults, an optional configuration file (TOML, YAML or
//! JSON, picked by extension) and prefixed environment variables, then
//! validates the result.

use std::path::{Path, PathBuf};
use anyhow::Context;
use parking_lot::RwLock;
use tracing::{debug, info};

use common::error::{Error, Result};

use crate::schema::OrchestratorConfig;
use crate::validation::ConfigValidator;

/// Default prefix for environment overrides (`UNIFIED_THRESHOLD`, `UNIFIED_LOGGING__LEVEL`, ...)
pub const ENV_PREFIX: &str = "UNIFIED";

/// Output format for rendering a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML document
    Toml,
    /// YAML document
    Yaml,
    /// Pretty-printed JSON document
    Json,
}

impl ConfigFormat {
    /// Picks a format from a file extension, defaulting to TOML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()) {
            Some(ext) if ext == "yaml" || ext == "yml" => ConfigFormat::Yaml,
            Some(ext) if ext == "json" => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    /// Current configuration
    config: RwLock<OrchestratorConfig>,

    /// File the configuration was loaded from
    source_path: Option<PathBuf>,

    /// Prefix used for environment overrides
    env_prefix: String,
}

impl ConfigManager {
    /// Loads configuration from `path`, or from the default location when it exists
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        let source_path = path.or_else(|| Self::default_path().filter(|p| p.exists()));
        Self::with_env_prefix(source_path, ENV_PREFIX)
    }

    /// Loads configuration using a custom environment prefix
    pub fn with_env_prefix(source_path: Option<PathBuf>, env_prefix: &str) -> Result<Self> {
        let config = Self::load(source_path.as_deref(), env_prefix)?;

        Ok(Self {
            config: RwLock::new(config),
            source_path,
            env_prefix: env_prefix.to_string(),
        })
    }

    /// Wraps an already built configuration after validating it
    pub fn from_config(config: OrchestratorConfig) -> Result<Self> {
        ConfigValidator::validate(&config)?;

        Ok(Self {
            config: RwLock::new(config),
            source_path: None,
            env_prefix: ENV_PREFIX.to_string(),
        })
    }

    /// Default configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("unified-orchestrator").join("config.toml"))
    }

    /// Builds and validates a configuration from the layered sources
    pub fn load(path: Option<&Path>, env_prefix: &str) -> Result<OrchestratorConfig> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: OrchestratorConfig = builder
            .build()
            .and_then(|built| built.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))?;

        ConfigValidator::validate(&config)?;

        debug!(
            "Configuration loaded: threshold={}, tick_interval_ms={}, groups={}",
            config.threshold,
            config.tick_interval_ms,
            config.tables.coordination_groups.len()
        );

        Ok(config)
    }

    /// Returns a snapshot of the current configuration
    pub fn config(&self) -> OrchestratorConfig {
        self.config.read().clone()
    }

    /// Returns the file the configuration was loaded from
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Applies an in-memory change; rejected changes leave the configuration untouched
    pub fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut OrchestratorConfig),
    {
        let mut candidate = self.config();
        change(&mut candidate);
        ConfigValidator::validate(&candidate)?;

        *self.config.write() = candidate;
        Ok(())
    }

    /// Reloads the configuration from its sources
    pub fn reload(&self) -> Result<()> {
        let config = Self::load(self.source_path.as_deref(), &self.env_prefix)?;
        *self.config.write() = config;

        info!("Configuration reloaded");
        Ok(())
    }

    /// Renders the current configuration
    pub fn render(&self, format: ConfigFormat) -> Result<String> {
        let config = self.config();

        match format {
            ConfigFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| Error::Config(e.to_string())),
            ConfigFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| Error::Config(e.to_string())),
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(&config)?),
        }
    }

    /// Writes the current configuration to `path`, format picked by extension
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let rendered = self.render(ConfigFormat::from_path(path))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        std::fs::write(path, rendered)
            .with_context(|| format!("writing {}", path.display()))?;

        info!("Configuration written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
threshold = 0.5
tick_interval_ms = 250

[tables]
coordination_groups = [["a", "b"], ["c"]]
"#
        )
        .unwrap();

        let manager = ConfigManager::with_env_prefix(
            Some(file.path().to_path_buf()),
            "UNIFIED_TEST_FILE_OVERRIDES",
        )
        .unwrap();
        let config = manager.config();

        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(config.tables.coordination_groups.len(), 2);
        // Untouched tables keep their defaults
        assert_eq!(config.tables.weights.len(), 4);
        assert_eq!(config.pattern, "x-_a-_x");
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "threshold": 2.0 }}"#).unwrap();

        let result = ConfigManager::with_env_prefix(
            Some(file.path().to_path_buf()),
            "UNIFIED_TEST_INVALID_FILE",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_update_validates() {
        let manager = ConfigManager::from_config(OrchestratorConfig::default()).unwrap();

        assert!(manager.update(|c| c.threshold = 0.0).is_err());
        assert_eq!(manager.config().threshold, crate::defaults::DEFAULT_THRESHOLD);

        manager.update(|c| c.tick_interval_ms = 10).unwrap();
        assert_eq!(manager.config().tick_interval_ms, 10);
    }

    #[test]
    fn test_largest_accepted_seed_survives_toml() {
        let manager = ConfigManager::from_config(OrchestratorConfig::default()).unwrap();

        assert!(manager.update(|c| c.rng_seed = Some(u64::MAX)).is_err());
        assert_eq!(manager.config().rng_seed, None);

        manager.update(|c| c.rng_seed = Some(i64::MAX as u64)).unwrap();
        let rendered = manager.render(ConfigFormat::Toml).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, rendered).unwrap();

        let reloaded = ConfigManager::with_env_prefix(Some(path), "UNIFIED_TEST_SEED_TOML").unwrap();
        assert_eq!(reloaded.config().rng_seed, Some(i64::MAX as u64));
    }

    #[test]
    fn test_save_and_reload_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let manager = ConfigManager::from_config(OrchestratorConfig::default()).unwrap();
        manager.update(|c| c.environment = "staging".to_string()).unwrap();
        manager.save(&path).unwrap();

        let reloaded = ConfigManager::with_env_prefix(Some(path), "UNIFIED_TEST_SAVE_YAML").unwrap();
        assert_eq!(reloaded.config().environment, "staging");
        assert_eq!(reloaded.config().tables, manager.config().tables);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("a.JSON")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a")), ConfigFormat::Toml);
    }
}
