//! Error types for the common crate
//!
//! This module defines the common error types used throughout the Unified Orchestrator.

use thiserror::Error;

/// Result type for Unified Orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for Unified Orchestrator operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Duplicate or empty subsystem name; rejects the whole registration
    #[error("Registration error: {0}")]
    Registration(String),

    /// A subsystem's initialize hook failed
    #[error("Initialization of '{subsystem}' failed: {reason}")]
    Initialization {
        /// Subsystem name
        subsystem: String,
        /// Failure reason
        reason: String,
    },

    /// A deployment target could not be resolved
    #[error("Deployment to '{target}' failed: {reason}")]
    DeploymentTarget {
        /// Target location
        target: String,
        /// Failure reason
        reason: String,
    },

    /// An optional hook failed
    #[error("Hook '{hook}' on '{subsystem}' failed: {reason}")]
    Hook {
        /// Subsystem name
        subsystem: String,
        /// Hook name
        hook: String,
        /// Failure reason
        reason: String,
    },

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid argument error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Creates a hook error
    pub fn hook(subsystem: impl Into<String>, hook: impl Into<String>, reason: impl ToString) -> Self {
        Error::Hook {
            subsystem: subsystem.into(),
            hook: hook.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true if the error is a registration error
    pub fn is_registration(&self) -> bool {
        matches!(self, Error::Registration(_))
    }

    /// Returns true if the error is an initialization error
    pub fn is_initialization(&self) -> bool {
        matches!(self, Error::Initialization { .. })
    }

    /// Returns true if the error is a deployment target error
    pub fn is_deployment_target(&self) -> bool {
        matches!(self, Error::DeploymentTarget { .. })
    }

    /// Returns true if the error is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Returns true if the error is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_predicates() {
        let err = Error::Registration("duplicate subsystem name: hub".to_string());
        assert!(err.is_registration());
        assert!(!err.is_timeout());

        let err = Error::Initialization {
            subsystem: "hub".to_string(),
            reason: "boom".to_string(),
        };
        assert!(err.is_initialization());
        assert_eq!(err.to_string(), "Initialization of 'hub' failed: boom");

        let err = Error::hook("hub", "connect", "refused");
        assert_eq!(err.to_string(), "Hook 'connect' on 'hub' failed: refused");
    }
}
