//! Configuration schema
//!
//! Every field has a default, so a configuration file only needs to list the
//! values it overrides.

use std::path::PathBuf;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_DEPLOYMENT_DELAY_MS, DEFAULT_DEPLOYMENT_TIMEOUT_MS, DEFAULT_ENVIRONMENT,
    DEFAULT_HOOK_TIMEOUT_MS, DEFAULT_PATTERN, DEFAULT_THRESHOLD, DEFAULT_TICK_INTERVAL_MS,
};
use crate::tables::StaticTables;

/// Top-level orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Environment name reported by the deployment entry point
    pub environment: String,

    /// Activation threshold; edges must be strictly above it
    pub threshold: f64,

    /// Universal pattern handed to every initialize hook
    pub pattern: String,

    /// Weight for pairs missing from the weight table (threshold² when unset)
    pub default_weight: Option<f64>,

    /// Maintenance tick interval in milliseconds
    pub tick_interval_ms: u64,

    /// Artificial delay per deployment target in milliseconds
    pub deployment_delay_ms: u64,

    /// Upper bound for resolving a single deployment target in milliseconds
    pub deployment_timeout_ms: u64,

    /// Upper bound for a single hook call in milliseconds
    pub hook_timeout_ms: u64,

    /// Seed for the maintenance tick's random source (entropy when unset)
    ///
    /// Limited to `i64::MAX` so it survives TOML and environment overrides.
    pub rng_seed: Option<u64>,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Static tables
    pub tables: StaticTables,
}

impl OrchestratorConfig {
    /// Weight used for pairs missing from the weight table
    pub fn effective_default_weight(&self) -> f64 {
        self.default_weight
            .unwrap_or(self.threshold * self.threshold)
    }

    /// Maintenance tick interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Artificial delay per deployment target
    pub fn deployment_delay(&self) -> Duration {
        Duration::from_millis(self.deployment_delay_ms)
    }

    /// Upper bound for resolving a single deployment target
    pub fn deployment_timeout(&self) -> Duration {
        Duration::from_millis(self.deployment_timeout_ms)
    }

    /// Upper bound for a single hook call
    pub fn hook_timeout(&self) -> Duration {
        Duration::from_millis(self.hook_timeout_ms)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            threshold: DEFAULT_THRESHOLD,
            pattern: DEFAULT_PATTERN.to_string(),
            default_weight: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            deployment_delay_ms: DEFAULT_DEPLOYMENT_DELAY_MS,
            deployment_timeout_ms: DEFAULT_DEPLOYMENT_TIMEOUT_MS,
            hook_timeout_ms: DEFAULT_HOOK_TIMEOUT_MS,
            rng_seed: None,
            logging: LoggingConfig::default(),
            tables: StaticTables::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,

    /// Emit JSON lines instead of human readable output
    pub json: bool,

    /// Directory for a daily rolling log file
    pub directory: Option<PathBuf>,

    /// File name prefix for the rolling log file
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
            file_prefix: "unified-orchestrator.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weight_falls_back_to_threshold_squared() {
        let config = OrchestratorConfig::default();
        assert!((config.effective_default_weight() - 0.381966011250105).abs() < 1e-9);

        let config = OrchestratorConfig {
            default_weight: Some(0.1),
            ..OrchestratorConfig::default()
        };
        assert_eq!(config.effective_default_weight(), 0.1);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: OrchestratorConfig = serde_json::from_str(r#"{ "threshold": 0.5 }"#).unwrap();
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.pattern, DEFAULT_PATTERN);
        assert_eq!(config.tick_interval(), Duration::from_secs(60));
        assert_eq!(config.tables.coordination_groups.len(), 3);
    }
}
