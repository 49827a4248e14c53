//! Main integration module for the Unified Orchestrator
//!
//! This module ties the configuration, logging and core crates together and
//! provides the environment-named deployment entry point.

pub mod builtin;

use std::sync::Arc;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use common::types::Outcome;
use orchestrator_config::{ConfigManager, OrchestratorConfig};
use orchestrator_core::{ActivationResult, OrchestratorEngine, Subsystem, SystemStatus};

pub use builtin::builtin_subsystems;

/// What `deploy` hands back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReport {
    /// Environment the system was deployed to
    pub environment: String,
    /// Activation outcome
    pub outcome: Outcome,
    /// Full activation result
    pub activation: ActivationResult,
    /// Status right after activation
    pub status: SystemStatus,
}

/// Main orchestrator facade
pub struct UnifiedOrchestrator {
    /// Configuration manager
    config_manager: Arc<ConfigManager>,

    /// Orchestration engine
    engine: OrchestratorEngine,
}

impl UnifiedOrchestrator {
    /// Creates an orchestrator with the built-in subsystem set
    pub fn new(config_manager: Arc<ConfigManager>) -> Result<Self> {
        Self::with_subsystems(config_manager, builtin_subsystems())
    }

    /// Creates an orchestrator with a custom subsystem set
    pub fn with_subsystems<I>(config_manager: Arc<ConfigManager>, subsystems: I) -> Result<Self>
    where
        I: IntoIterator<Item = Subsystem>,
    {
        let engine = OrchestratorEngine::new(config_manager.config())
            .context("failed to build the orchestration engine")?;
        engine
            .register_subsystems(subsystems)
            .context("failed to register subsystems")?;

        Ok(Self {
            config_manager,
            engine,
        })
    }

    /// Gets the configuration manager
    pub fn config_manager(&self) -> Arc<ConfigManager> {
        self.config_manager.clone()
    }

    /// Gets the orchestration engine
    pub fn engine(&self) -> &OrchestratorEngine {
        &self.engine
    }

    /// Runs the full activation
    pub async fn activate(&self) -> ActivationResult {
        self.engine.activate().await
    }

    /// Gets a status snapshot
    pub fn status(&self) -> SystemStatus {
        self.engine.status()
    }

    /// Stops the maintenance heartbeat
    pub async fn shutdown(&self) {
        self.engine.shutdown().await
    }

    /// Activates and reports against the configured environment
    pub async fn deploy(&self) -> DeploymentReport {
        let environment = self.engine.config().environment.clone();
        info!("Deploying unified system to '{}'", environment);

        let activation = self.activate().await;
        let status = self.status();

        DeploymentReport {
            environment,
            outcome: activation.outcome,
            activation,
            status,
        }
    }
}

/// Builds the orchestrator with the built-in subsystems, activates it and
/// returns it with the deployment report
///
/// The returned orchestrator keeps the maintenance heartbeat running until it
/// is shut down or dropped.
pub async fn deploy_unified_system(
    environment: &str,
    mut config: OrchestratorConfig,
) -> Result<(UnifiedOrchestrator, DeploymentReport)> {
    config.environment = environment.to_string();

    let config_manager = Arc::new(ConfigManager::from_config(config)?);
    let orchestrator = UnifiedOrchestrator::new(config_manager)?;
    let report = orchestrator.deploy().await;

    Ok((orchestrator, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> OrchestratorConfig {
        OrchestratorConfig {
            deployment_delay_ms: 0,
            rng_seed: Some(1),
            ..OrchestratorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_deploy_builtin_system() {
        let (orchestrator, report) = deploy_unified_system("staging", fast_config()).await.unwrap();

        assert_eq!(report.environment, "staging");
        assert_eq!(report.outcome, Outcome::Success);
        assert_eq!(report.activation.components, 7);
        assert_eq!(report.activation.initialized, 7);
        assert_eq!(report.activation.deployment_targets, 8);
        assert_eq!(report.activation.coordination_groups, 3);
        assert_eq!(report.status.environment, "staging");

        // interface-hub (1.0) and memory_bridge-artifacts (0.854) pass; 0.618 sits on the threshold
        assert_eq!(report.activation.active_connections, 2);

        orchestrator.shutdown().await;
    }

    #[tokio::test]
    async fn test_custom_subsystems_replace_builtins() {
        let config_manager = Arc::new(ConfigManager::from_config(fast_config()).unwrap());
        let orchestrator = UnifiedOrchestrator::with_subsystems(config_manager, Vec::new()).unwrap();

        let report = orchestrator.deploy().await;
        assert_eq!(report.activation.components, 0);
        assert_eq!(report.activation.coordination_groups, 0);

        orchestrator.shutdown().await;
    }
}
