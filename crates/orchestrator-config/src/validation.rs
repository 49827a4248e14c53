//! Configuration validation

use std::collections::HashMap;

use common::error::{Error, Result};

use crate::schema::OrchestratorConfig;

/// Validates a loaded configuration
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the whole configuration, returning the first problem found
    pub fn validate(config: &OrchestratorConfig) -> Result<()> {
        if !(config.threshold > 0.0 && config.threshold <= 1.0) {
            return Err(Error::Config(format!(
                "threshold must be in (0, 1], got {}",
                config.threshold
            )));
        }

        if let Some(weight) = config.default_weight {
            Self::check_weight("default_weight", weight)?;
        }

        if config.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be positive".to_string()));
        }

        if config.hook_timeout_ms == 0 {
            return Err(Error::Config("hook_timeout_ms must be positive".to_string()));
        }

        if config.deployment_timeout_ms <= config.deployment_delay_ms {
            return Err(Error::Config(format!(
                "deployment_timeout_ms ({}) must exceed deployment_delay_ms ({})",
                config.deployment_timeout_ms, config.deployment_delay_ms
            )));
        }

        // TOML and the config crate both carry integers as i64
        if let Some(seed) = config.rng_seed {
            if seed > i64::MAX as u64 {
                return Err(Error::Config(format!(
                    "rng_seed must not exceed {}, got {}",
                    i64::MAX,
                    seed
                )));
            }
        }

        Self::validate_weights(config)?;
        Self::validate_groups(config)?;
        Self::validate_targets(config)?;

        Ok(())
    }

    fn check_weight(what: &str, weight: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(Error::Config(format!(
                "{} must be in [0, 1], got {}",
                what, weight
            )));
        }
        Ok(())
    }

    fn validate_weights(config: &OrchestratorConfig) -> Result<()> {
        let mut seen: HashMap<(&str, &str), f64> = HashMap::new();

        for entry in &config.tables.weights {
            if entry.a.is_empty() || entry.b.is_empty() {
                return Err(Error::Config("weight entry with empty endpoint".to_string()));
            }
            if entry.a == entry.b {
                return Err(Error::Config(format!("weight entry '{}' connects to itself", entry.a)));
            }
            Self::check_weight(&format!("weight {}-{}", entry.a, entry.b), entry.weight)?;

            let key = if entry.a <= entry.b {
                (entry.a.as_str(), entry.b.as_str())
            } else {
                (entry.b.as_str(), entry.a.as_str())
            };

            // Repeats are tolerated only when they agree
            if let Some(previous) = seen.insert(key, entry.weight) {
                if previous != entry.weight {
                    return Err(Error::Config(format!(
                        "conflicting weights for {}-{}: {} and {}",
                        key.0, key.1, previous, entry.weight
                    )));
                }
            }
        }

        Ok(())
    }

    fn validate_groups(config: &OrchestratorConfig) -> Result<()> {
        for (index, group) in config.tables.coordination_groups.iter().enumerate() {
            if group.is_empty() {
                return Err(Error::Config(format!("coordination group {} is empty", index)));
            }
            if group.iter().any(|name| name.is_empty()) {
                return Err(Error::Config(format!(
                    "coordination group {} contains an empty name",
                    index
                )));
            }
        }
        Ok(())
    }

    fn validate_targets(config: &OrchestratorConfig) -> Result<()> {
        for category in &config.tables.deployment_targets {
            if category.category.is_empty() {
                return Err(Error::Config("deployment category with empty name".to_string()));
            }
            for target in &category.targets {
                if target.location.is_empty() {
                    return Err(Error::Config(format!(
                        "deployment target {}/{} has no location",
                        category.category, target.name
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::WeightEntry;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ConfigValidator::validate(&OrchestratorConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = OrchestratorConfig::default();
        config.threshold = 1.5;
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = OrchestratorConfig::default();
        config.tables.weights.push(WeightEntry::new("a", "b", -0.1));
        assert!(ConfigValidator::validate(&config).is_err());

        let mut config = OrchestratorConfig::default();
        config.tick_interval_ms = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_deployment_timeout_must_exceed_delay() {
        let mut config = OrchestratorConfig::default();
        config.deployment_delay_ms = 80;
        config.hook_timeout_ms = 20;
        config.deployment_timeout_ms = 80;
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("deployment_timeout_ms"));

        // The hook bound plays no part in the deployment pass
        config.deployment_timeout_ms = 81;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_rng_seed_must_fit_signed_range() {
        let mut config = OrchestratorConfig::default();
        config.rng_seed = Some(i64::MAX as u64);
        assert!(ConfigValidator::validate(&config).is_ok());

        config.rng_seed = Some(u64::MAX);
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("rng_seed"));
    }

    #[test]
    fn test_rejects_conflicting_duplicate_weights() {
        let mut config = OrchestratorConfig::default();
        config.tables.weights = vec![
            WeightEntry::new("a", "b", 0.7),
            WeightEntry::new("b", "a", 0.7),
        ];
        assert!(ConfigValidator::validate(&config).is_ok());

        config.tables.weights.push(WeightEntry::new("a", "b", 0.2));
        let err = ConfigValidator::validate(&config).unwrap_err();
        assert!(err.to_string().contains("conflicting weights"));
    }

    #[test]
    fn test_rejects_empty_group() {
        let mut config = OrchestratorConfig::default();
        config.tables.coordination_groups.push(Vec::new());
        assert!(ConfigValidator::validate(&config).is_err());
    }
}
