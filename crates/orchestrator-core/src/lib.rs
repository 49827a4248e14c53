//! Core orchestration logic for the Unified Orchestrator
//!
//! This crate provides the subsystem capability interface, the registry, the
//! thresholded connection graph, the deployment and coordination passes, the
//! maintenance heartbeat and the engine tying them together.

pub mod coordinator;
pub mod deployment;
pub mod engine;
pub mod graph;
pub mod lifecycle;
pub mod metrics;
pub mod random;
pub mod registry;
pub mod state;
pub mod subsystem;

// Re-export commonly used types
pub use coordinator::{Coordinator, TickReport};
pub use deployment::{DeploymentResolver, SimulatedResolver};
pub use engine::{ActivationResult, HeartbeatStatus, OrchestratorEngine, SubsystemSummary, SystemStatus};
pub use graph::{CategoryRules, ConnectionGraph, WeightTable};
pub use lifecycle::{Heartbeat, LifecycleManager};
pub use metrics::{ActivityMetrics, MetricsSnapshot};
pub use random::{RandomSource, SeededRandom, SequenceRandom};
pub use registry::SubsystemRegistry;
pub use state::OrchestratorState;
pub use subsystem::{Capability, PatternStages, Subsystem};
