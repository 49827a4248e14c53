//! Core orchestration engine implementation
//!
//! The engine owns the subsystem registry, the connection graph, the
//! coordinator and the heartbeat. `activate` drives every registered
//! subsystem through the activation phases in order:
//!
//! 1. initialize each subsystem
//! 2. connect every pair whose weight passes the threshold
//! 3. the pattern pass
//! 4. the deployment pass
//! 5. coordination groups
//! 6. start the maintenance heartbeat
//!
//! Every per-subsystem and per-target failure is recorded and the phase moves
//! on. Activations and maintenance ticks never overlap.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Instant;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use common::error::{Error, Result};
use common::models::{
    ActiveConnection, ComponentRecord, CoordinationGroup, DeploymentRecord, PatternOutcome, PatternRecord,
};
use common::types::Outcome;
use common::utils::{format_duration, measure_execution_time_async};
use orchestrator_config::{ConfigValidator, OrchestratorConfig, WeightEntry};

use crate::coordinator::{Coordinator, TickReport};
use crate::deployment::{deploy_all, DeploymentResolver, SimulatedResolver};
use crate::graph::{CategoryRules, ConnectionGraph, WeightTable};
use crate::lifecycle::{LifecycleManager, TickFn};
use crate::metrics::{ActivityMetrics, MetricsSnapshot};
use crate::random::{RandomSource, SeededRandom};
use crate::registry::SubsystemRegistry;
use crate::state::OrchestratorState;
use crate::subsystem::{Capability, Subsystem};

/// Aggregate result of one activation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationResult {
    /// `success` unless some initialization or deployment failed
    pub outcome: Outcome,
    /// Registered subsystems
    pub components: usize,
    /// Subsystems whose initialize hook succeeded
    pub initialized: usize,
    /// Active connections
    pub active_connections: usize,
    /// Deployment targets attempted
    pub deployment_targets: usize,
    /// Deployment targets resolved
    pub deployed: usize,
    /// Coordination groups formed
    pub coordination_groups: usize,
    /// Per-subsystem initialization records
    pub component_records: Vec<ComponentRecord>,
    /// Materialized active connections
    pub connections: Vec<ActiveConnection>,
    /// Per-subsystem pattern pass records
    pub patterns: Vec<PatternRecord>,
    /// Per-target deployment records
    pub deployments: Vec<DeploymentRecord>,
    /// Coordination groups
    pub groups: Vec<CoordinationGroup>,
    /// Threshold used
    pub threshold: f64,
    /// Pattern handed to every subsystem
    pub pattern: String,
    /// Activation start
    pub activated_at: DateTime<Utc>,
    /// Wall time of the whole activation
    pub duration_ms: u64,
}

/// Per-subsystem line of the status snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemSummary {
    /// Registered name
    pub name: String,
    /// Hooks the subsystem exposes
    pub capabilities: Vec<Capability>,
    /// Initialization result of the last activation, `None` before one
    pub initialized: Option<bool>,
}

/// Heartbeat part of the status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatStatus {
    /// Whether the timer task is alive
    pub running: bool,
    /// Firing interval
    pub interval_ms: u64,
    /// Maintenance ticks run so far
    pub ticks: u64,
}

/// Read-only snapshot of the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Lifecycle state
    pub state: OrchestratorState,
    /// Environment name
    pub environment: String,
    /// Registered subsystems
    pub components: usize,
    /// Subsystems initialized by the last activation
    pub initialized: usize,
    /// Active connections
    pub active_connections: usize,
    /// Coordination groups
    pub coordination_groups: usize,
    /// Per-subsystem summaries in registration order
    pub subsystems: Vec<SubsystemSummary>,
    /// Heartbeat state and counters
    pub heartbeat: HeartbeatStatus,
    /// Activation threshold
    pub threshold: f64,
    /// Universal pattern
    pub pattern: String,
    /// Static adjacency table
    pub connection_matrix: BTreeMap<String, Vec<String>>,
    /// Static weight table
    pub weights: Vec<WeightEntry>,
    /// Deployment targets in the static table
    pub deployment_targets: usize,
    /// Activity counters
    pub metrics: MetricsSnapshot,
}

/// State shared with the heartbeat task
struct EngineInner {
    /// Configuration the engine was built from
    config: OrchestratorConfig,

    /// Registered subsystems
    registry: RwLock<Arc<SubsystemRegistry>>,

    /// Thresholded connection graph
    graph: ConnectionGraph,

    /// Deployment target resolver
    resolver: RwLock<Arc<dyn DeploymentResolver>>,

    /// Coordination groups and the maintenance pass
    coordinator: Coordinator,

    /// Lifecycle state and heartbeat
    lifecycle: LifecycleManager,

    /// Activity counters
    metrics: Arc<ActivityMetrics>,

    /// Serializes activations and maintenance ticks
    run_lock: Mutex<()>,

    /// Initialization records of the last activation
    component_records: RwLock<Vec<ComponentRecord>>,

    /// Active connections of the last activation
    connections: RwLock<Vec<ActiveConnection>>,
}

/// The main orchestration engine
pub struct OrchestratorEngine {
    inner: Arc<EngineInner>,
}

impl OrchestratorEngine {
    /// Creates an engine with no subsystems
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        ConfigValidator::validate(&config)?;

        let metrics = Arc::new(ActivityMetrics::new());

        let table = WeightTable::from_entries(&config.tables.weights, config.effective_default_weight());
        let graph = ConnectionGraph::new(
            table,
            CategoryRules::new(config.tables.categories.clone()),
            config.threshold,
        );

        let coordinator = Coordinator::new(
            Box::new(SeededRandom::new(config.rng_seed)),
            config.threshold,
            config.hook_timeout(),
            metrics.clone(),
        );

        let resolver: Arc<dyn DeploymentResolver> = Arc::new(SimulatedResolver::new(config.deployment_delay()));
        let lifecycle = LifecycleManager::new(config.tick_interval());

        debug!(
            "Engine created (threshold: {}, default weight: {}, tick: {:?})",
            config.threshold,
            config.effective_default_weight(),
            config.tick_interval()
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                registry: RwLock::new(Arc::new(SubsystemRegistry::new())),
                graph,
                resolver: RwLock::new(resolver),
                coordinator,
                lifecycle,
                metrics,
                run_lock: Mutex::new(()),
                component_records: RwLock::new(Vec::new()),
                connections: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Replaces the random source used by the maintenance tick
    pub fn with_random(self, random: Box<dyn RandomSource>) -> Self {
        self.inner.coordinator.replace_random(random);
        self
    }

    /// Replaces the deployment target resolver
    pub fn with_resolver(self, resolver: Arc<dyn DeploymentResolver>) -> Self {
        *self.inner.resolver.write() = resolver;
        self
    }

    /// Configuration the engine was built from
    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> OrchestratorState {
        self.inner.lifecycle.state()
    }

    /// Replaces the registered subsystem set
    ///
    /// Fails with a registration error on empty or duplicate names, or while
    /// an activation, tick or shutdown holds the run lock. The previous set is
    /// kept on failure.
    pub fn register_subsystems<I>(&self, subsystems: I) -> Result<()>
    where
        I: IntoIterator<Item = Subsystem>,
    {
        let _guard = self.inner.run_lock.try_lock().map_err(|_| {
            Error::Registration("cannot replace subsystems while an activation is in progress".to_string())
        })?;

        let state = self.state();
        if !state.accepts_registration() {
            return Err(Error::Registration(format!(
                "cannot replace subsystems while {}",
                state
            )));
        }

        let registry = SubsystemRegistry::from_subsystems(subsystems)?;
        info!("Registered {} subsystems: {:?}", registry.len(), registry.names());

        *self.inner.registry.write() = Arc::new(registry);
        self.inner.component_records.write().clear();
        self.inner.connections.write().clear();

        Ok(())
    }

    /// Runs the full activation and starts the heartbeat
    pub async fn activate(&self) -> ActivationResult {
        let inner = &self.inner;
        let _guard = inner.run_lock.lock().await;

        // Re-activation replaces the previous heartbeat
        inner.lifecycle.heartbeat().stop().await;
        inner.lifecycle.transition_to(OrchestratorState::Activating);

        let started = Instant::now();
        let activated_at = Utc::now();
        let registry = inner.registry.read().clone();
        let config = &inner.config;

        info!(
            "Activating {} subsystems (threshold: {}, pattern: {})",
            registry.len(),
            config.threshold,
            config.pattern
        );

        // Step 1: initialization
        let component_records = inner.initialize_all(&registry).await;

        // Step 2: connections
        let connections = inner.connect_all(&registry).await;

        // Step 3: pattern pass
        let patterns = inner.pattern_pass(&registry).await;

        // Step 4: deployment pass
        let deployments = if registry.is_empty() {
            debug!("No subsystems registered, skipping deployment pass");
            Vec::new()
        } else {
            let resolver = inner.resolver.read().clone();
            let (records, elapsed) = measure_execution_time_async(deploy_all(
                &*resolver,
                &config.tables.deployment_targets,
                &config.pattern,
                config.deployment_timeout(),
            ))
            .await;
            debug!("Deployment pass took {}", format_duration(elapsed));
            records
        };

        // Step 5: coordination groups
        let groups = inner
            .coordinator
            .form_groups(&registry, &config.tables.coordination_groups)
            .await;

        // Step 6: heartbeat
        inner.lifecycle.start(tick_fn(Arc::downgrade(&self.inner))).await;

        *inner.component_records.write() = component_records.clone();
        *inner.connections.write() = connections.clone();
        inner.metrics.record_activation();

        let initialized = component_records.iter().filter(|r| r.is_initialized()).count();
        let deployed = deployments.iter().filter(|r| r.is_deployed()).count();
        let outcome = if initialized == component_records.len() && deployed == deployments.len() {
            Outcome::Success
        } else {
            Outcome::PartialFailure
        };

        let result = ActivationResult {
            outcome,
            components: registry.len(),
            initialized,
            active_connections: connections.len(),
            deployment_targets: deployments.len(),
            deployed,
            coordination_groups: groups.len(),
            component_records,
            connections,
            patterns,
            deployments,
            groups,
            threshold: config.threshold,
            pattern: config.pattern.clone(),
            activated_at,
            duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Activation finished: {} ({}/{} initialized, {} connections, {}/{} targets, {} groups)",
            result.outcome,
            result.initialized,
            result.components,
            result.active_connections,
            result.deployed,
            result.deployment_targets,
            result.coordination_groups
        );

        result
    }

    /// Read-only snapshot; never fails and has no side effects
    pub fn status(&self) -> SystemStatus {
        let inner = &self.inner;
        let config = &inner.config;
        let registry = inner.registry.read().clone();
        let records = inner.component_records.read();

        let subsystems = registry
            .iter()
            .map(|subsystem| SubsystemSummary {
                name: subsystem.name().to_string(),
                capabilities: subsystem.capability_list(),
                initialized: records
                    .iter()
                    .find(|r| r.name == subsystem.name())
                    .map(|r| r.is_initialized()),
            })
            .collect();

        let heartbeat = inner.lifecycle.heartbeat();

        SystemStatus {
            state: inner.lifecycle.state(),
            environment: config.environment.clone(),
            components: registry.len(),
            initialized: records.iter().filter(|r| r.is_initialized()).count(),
            active_connections: inner.connections.read().len(),
            coordination_groups: inner.coordinator.group_count(),
            subsystems,
            heartbeat: HeartbeatStatus {
                running: heartbeat.is_running(),
                interval_ms: heartbeat.interval().as_millis() as u64,
                ticks: inner.metrics.ticks(),
            },
            threshold: config.threshold,
            pattern: config.pattern.clone(),
            connection_matrix: config.tables.connection_matrix.clone(),
            weights: config.tables.weights.clone(),
            deployment_targets: config.tables.deployment_target_count(),
            metrics: inner.metrics.snapshot(),
        }
    }

    /// Active connections of the last activation
    pub fn active_connections(&self) -> Vec<ActiveConnection> {
        self.inner.connections.read().clone()
    }

    /// Coordination groups of the last activation
    pub fn coordination_groups(&self) -> Vec<CoordinationGroup> {
        self.inner.coordinator.groups()
    }

    /// Runs one maintenance pass now
    pub async fn run_maintenance_tick(&self) -> TickReport {
        self.inner.maintenance_tick().await
    }

    /// Stops the heartbeat; idempotent and safe before any activation
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        let _guard = inner.run_lock.lock().await;

        if inner.lifecycle.state().is_stopped() {
            debug!("Shutdown requested but the orchestrator is already stopped");
            return;
        }

        info!("Shutting down orchestrator");
        inner.lifecycle.stop().await;
        inner.coordinator.stop_groups();
        info!("Orchestrator stopped");
    }
}

impl EngineInner {
    async fn initialize_all(&self, registry: &SubsystemRegistry) -> Vec<ComponentRecord> {
        let mut records = Vec::with_capacity(registry.len());

        for subsystem in registry.iter() {
            let name = subsystem.name();
            let result = subsystem
                .initialize(self.config.threshold, &self.config.pattern, self.config.hook_timeout())
                .await;

            self.metrics.record_hook(name, Capability::Initialize, result.is_ok());

            match result {
                Ok(status) => {
                    debug!("Initialized {}: {}", name, status.status);
                    records.push(ComponentRecord::initialized(name, status));
                }
                Err(e) => {
                    warn!("{}", e);
                    records.push(ComponentRecord::failed(name, e));
                }
            }
        }

        records
    }

    async fn connect_all(&self, registry: &SubsystemRegistry) -> Vec<ActiveConnection> {
        let names = registry.names();
        let timeout = self.config.hook_timeout();

        for edge in self.graph.retained_edges(&names) {
            let (Some(source), Some(target)) = (registry.get(&edge.source), registry.get(&edge.target)) else {
                continue;
            };

            if let Some(result) = source.connect(&edge.target, edge.weight, timeout).await {
                self.metrics.record_hook(&edge.source, Capability::Connect, result.is_ok());
                match result {
                    Ok(_) => debug!("{} connected to {} ({})", edge.source, edge.target, edge.weight),
                    Err(e) => warn!("{}", e),
                }
            }

            if let Some(result) = target.receive_connection(&edge.source, edge.weight, timeout).await {
                self.metrics.record_hook(&edge.target, Capability::ReceiveConnection, result.is_ok());
                if let Err(e) = result {
                    warn!("{}", e);
                }
            }
        }

        let connections = self.graph.active_connections(&names);
        info!("{} active connections above threshold {}", connections.len(), self.graph.threshold());
        connections
    }

    async fn pattern_pass(&self, registry: &SubsystemRegistry) -> Vec<PatternRecord> {
        let stages = &self.config.tables.pattern_stages;
        let timeout = self.config.hook_timeout();
        let mut records = Vec::with_capacity(registry.len());

        for subsystem in registry.iter() {
            let name = subsystem.name();
            let outcome = match subsystem.apply_pattern(stages, timeout).await {
                Some(Ok(value)) => {
                    self.metrics.record_hook(name, Capability::ApplyPattern, true);
                    PatternOutcome::Applied(value)
                }
                Some(Err(e)) => {
                    warn!("{}", e);
                    self.metrics.record_hook(name, Capability::ApplyPattern, false);
                    PatternOutcome::Failed(e.to_string())
                }
                None => PatternOutcome::Defaulted,
            };

            records.push(PatternRecord {
                name: name.to_string(),
                outcome,
            });
        }

        records
    }

    async fn maintenance_tick(&self) -> TickReport {
        let _guard = self.run_lock.lock().await;
        let registry = self.registry.read().clone();
        self.coordinator.maintain(&registry).await
    }
}

/// Tick closure for the heartbeat; holds the engine weakly
fn tick_fn(inner: Weak<EngineInner>) -> TickFn {
    Arc::new(move || {
        let inner = inner.clone();
        async move {
            if let Some(inner) = inner.upgrade() {
                inner.maintenance_tick().await;
            }
        }
        .boxed()
    })
}
