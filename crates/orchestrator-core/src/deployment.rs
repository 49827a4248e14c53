//! Deployment pass
//!
//! Walks the deployment-target table in order and resolves every target
//! through a [`DeploymentResolver`]. A failing target is recorded and the
//! pass moves on.

use std::time::Duration;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use common::error::{Error, Result};
use common::models::{DeploymentReceipt, DeploymentRecord};
use common::utils::execute_with_timeout;
use orchestrator_config::{TargetCategory, TargetDescriptor};

/// Resolves a single deployment target
#[async_trait]
pub trait DeploymentResolver: Send + Sync {
    /// Gets the name of the resolver
    fn name(&self) -> &str;

    /// Resolves the target and returns a receipt
    async fn resolve(&self, target: &TargetDescriptor, pattern: &str) -> Result<DeploymentReceipt>;
}

/// Resolver that waits a fixed delay and performs no I/O
#[derive(Debug, Clone)]
pub struct SimulatedResolver {
    /// Artificial delay per target
    delay: Duration,
}

impl SimulatedResolver {
    /// Creates a simulated resolver
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl DeploymentResolver for SimulatedResolver {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn resolve(&self, target: &TargetDescriptor, pattern: &str) -> Result<DeploymentReceipt> {
        // Validated tables never get here; direct callers of `deploy_all` can
        if target.location.trim().is_empty() {
            return Err(Error::DeploymentTarget {
                target: target.name.clone(),
                reason: "empty location".to_string(),
            });
        }

        tokio::time::sleep(self.delay).await;

        Ok(DeploymentReceipt {
            status: "deployed".to_string(),
            location: target.location.clone(),
            timestamp: Utc::now(),
            pattern: pattern.to_string(),
        })
    }
}

/// Resolves every target in table order
///
/// Each resolution is bounded by `timeout`. Failures become records carrying
/// the error message.
pub async fn deploy_all(
    resolver: &dyn DeploymentResolver,
    categories: &[TargetCategory],
    pattern: &str,
    timeout: Duration,
) -> Vec<DeploymentRecord> {
    let mut records = Vec::new();

    for category in categories {
        for target in &category.targets {
            debug!("Resolving {}/{} via {}", category.category, target.name, resolver.name());

            let operation = format!("deploy {}/{}", category.category, target.name);
            let result = execute_with_timeout(resolver.resolve(target, pattern), timeout, &operation).await;

            let record = match result {
                Ok(receipt) => DeploymentRecord {
                    category: category.category.clone(),
                    name: target.name.clone(),
                    location: target.location.clone(),
                    receipt: Some(receipt),
                    error: None,
                },
                Err(e) => {
                    let e = match e {
                        e @ Error::DeploymentTarget { .. } => e,
                        other => Error::DeploymentTarget {
                            target: target.name.clone(),
                            reason: other.to_string(),
                        },
                    };
                    warn!("{}", e);
                    DeploymentRecord {
                        category: category.category.clone(),
                        name: target.name.clone(),
                        location: target.location.clone(),
                        receipt: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            records.push(record);
        }
    }

    let deployed = records.iter().filter(|r| r.is_deployed()).count();
    info!("Deployment pass finished: {}/{} targets resolved", deployed, records.len());

    records
}
