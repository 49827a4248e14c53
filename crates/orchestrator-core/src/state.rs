//! State management for the orchestrator
//!
//! This module provides the lifecycle state of the orchestrator.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Represents the current state of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    /// Subsystems registered (or not), nothing activated yet
    Idle,

    /// An activation is in flight
    Activating,

    /// Activated; the maintenance tick is running
    Running,

    /// Shut down
    Stopped,
}

impl OrchestratorState {
    /// Creates a new orchestrator state
    pub fn new() -> Self {
        OrchestratorState::Idle
    }

    /// Returns true if the system is running
    pub fn is_running(&self) -> bool {
        matches!(self, OrchestratorState::Running)
    }

    /// Returns true if an activation is in flight
    pub fn is_activating(&self) -> bool {
        matches!(self, OrchestratorState::Activating)
    }

    /// Returns true if the system is stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self, OrchestratorState::Stopped)
    }

    /// Returns true if the registry may be replaced in this state
    pub fn accepts_registration(&self) -> bool {
        matches!(self, OrchestratorState::Idle | OrchestratorState::Stopped)
    }
}

impl fmt::Display for OrchestratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorState::Idle => write!(f, "Idle"),
            OrchestratorState::Activating => write!(f, "Activating"),
            OrchestratorState::Running => write!(f, "Running"),
            OrchestratorState::Stopped => write!(f, "Stopped"),
        }
    }
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_methods() {
        let idle = OrchestratorState::Idle;
        assert!(!idle.is_running());
        assert!(idle.accepts_registration());

        let activating = OrchestratorState::Activating;
        assert!(activating.is_activating());
        assert!(!activating.accepts_registration());

        let running = OrchestratorState::Running;
        assert!(running.is_running());
        assert!(!running.accepts_registration());

        let stopped = OrchestratorState::Stopped;
        assert!(stopped.is_stopped());
        assert!(stopped.accepts_registration());
    }

    #[test]
    fn test_display() {
        assert_eq!(OrchestratorState::Idle.to_string(), "Idle");
        assert_eq!(OrchestratorState::Activating.to_string(), "Activating");
        assert_eq!(OrchestratorState::Running.to_string(), "Running");
        assert_eq!(OrchestratorState::Stopped.to_string(), "Stopped");
    }

    #[test]
    fn test_default_and_serialization() {
        assert_eq!(OrchestratorState::default(), OrchestratorState::Idle);
        assert_eq!(
            serde_json::to_value(OrchestratorState::Running).unwrap(),
            serde_json::json!("running")
        );
    }
}
