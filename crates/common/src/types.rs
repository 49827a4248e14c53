//! Common types for the Unified Orchestrator
//!
//! This module defines small enumerations shared across the workspace.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

/// Category assigned to a connection between two subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionCategory {
    /// Bridge between interface-facing subsystems
    Bridge,
    /// Data flowing between storage-like subsystems
    DataFlow,
    /// Coordination between hub-like subsystems
    Coordination,
    /// Fallback when no category rule matches both endpoints
    Universal,
}

impl Default for ConnectionCategory {
    fn default() -> Self {
        ConnectionCategory::Universal
    }
}

impl fmt::Display for ConnectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionCategory::Bridge => write!(f, "bridge"),
            ConnectionCategory::DataFlow => write!(f, "data_flow"),
            ConnectionCategory::Coordination => write!(f, "coordination"),
            ConnectionCategory::Universal => write!(f, "universal"),
        }
    }
}

impl FromStr for ConnectionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bridge" => Ok(ConnectionCategory::Bridge),
            "data_flow" | "data-flow" | "dataflow" => Ok(ConnectionCategory::DataFlow),
            "coordination" => Ok(ConnectionCategory::Coordination),
            "universal" | "default" => Ok(ConnectionCategory::Universal),
            _ => Err(format!("Unknown connection category: {}", s)),
        }
    }
}

/// Aggregate outcome of an activation
///
/// Total failure is never distinguished from partial failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every unit succeeded
    Success,
    /// At least one subsystem or deployment target failed
    PartialFailure,
}

impl Outcome {
    /// Returns true for a fully successful run
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::PartialFailure => write!(f, "partial_failure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse_and_display() {
        assert_eq!("data-flow".parse::<ConnectionCategory>(), Ok(ConnectionCategory::DataFlow));
        assert_eq!("default".parse::<ConnectionCategory>(), Ok(ConnectionCategory::Universal));
        assert!("mystery".parse::<ConnectionCategory>().is_err());
        assert_eq!(ConnectionCategory::Coordination.to_string(), "coordination");
        assert_eq!(ConnectionCategory::default(), ConnectionCategory::Universal);
    }
}
