//! Configuration management for the Unified Orchestrator
//!
//! This crate provides the typed orchestrator configuration, the static tables
//! consumed at activation, and layered loading from files and the environment.

pub mod defaults;
pub mod manager;
pub mod schema;
pub mod tables;
pub mod validation;

// Re-export commonly used types
pub use manager::{ConfigFormat, ConfigManager, ENV_PREFIX};
pub use schema::{LoggingConfig, OrchestratorConfig};
pub use tables::{CategoryRule, StaticTables, TargetCategory, TargetDescriptor, WeightEntry};
pub use validation::ConfigValidator;
