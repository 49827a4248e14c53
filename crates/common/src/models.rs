//! Common data models for the Unified Orchestrator
//!
//! This module defines the records produced while driving subsystems through
//! their lifecycle: initialization records, connections, pattern outcomes,
//! deployment receipts and coordination groups.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::types::ConnectionCategory;

/// Acknowledgement returned by the optional connection and coordination hooks
pub type Ack = Value;

/// Status record returned by a subsystem's initialize hook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Human readable status line
    pub status: String,
    /// Free-form details reported by the subsystem
    #[serde(default)]
    pub details: Map<String, Value>,
}

impl StatusRecord {
    /// Creates a status record without details
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            details: Map::new(),
        }
    }

    /// Adds a detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

/// Per-subsystem initialization record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Subsystem name
    pub name: String,
    /// Status returned by the subsystem (if initialization succeeded)
    pub status: Option<StatusRecord>,
    /// Error message (if initialization failed)
    pub error: Option<String>,
}

impl ComponentRecord {
    /// Record for a successful initialization
    pub fn initialized(name: impl Into<String>, status: StatusRecord) -> Self {
        Self {
            name: name.into(),
            status: Some(status),
            error: None,
        }
    }

    /// Record for a failed initialization
    pub fn failed(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            status: None,
            error: Some(error.to_string()),
        }
    }

    /// Returns true if the subsystem initialized successfully
    pub fn is_initialized(&self) -> bool {
        self.error.is_none()
    }
}

/// An edge whose weight exceeded the activation threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveConnection {
    /// Endpoint registered first
    pub from: String,
    /// Endpoint registered second
    pub to: String,
    /// Edge weight in [0, 1]
    pub weight: f64,
    /// Connection category
    pub category: ConnectionCategory,
}

impl ActiveConnection {
    /// Returns true if the connection touches the given subsystem
    pub fn involves(&self, name: &str) -> bool {
        self.from == name || self.to == name
    }
}

/// Result of the pattern pass for a single subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum PatternOutcome {
    /// The subsystem applied the pattern and returned a record
    Applied(Value),
    /// The subsystem has no pattern hook; the default outcome is recorded
    Defaulted,
    /// The pattern hook failed
    Failed(String),
}

impl PatternOutcome {
    /// Returns true unless the hook failed
    pub fn is_ok(&self) -> bool {
        !matches!(self, PatternOutcome::Failed(_))
    }
}

/// Pattern pass record for a single subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// Subsystem name
    pub name: String,
    /// What the pass produced
    pub outcome: PatternOutcome,
}

/// Receipt for a resolved deployment target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    /// Resolution status
    pub status: String,
    /// Target location descriptor
    pub location: String,
    /// Resolution timestamp
    pub timestamp: DateTime<Utc>,
    /// Universal pattern stamped on the receipt
    pub pattern: String,
}

/// Per-target deployment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Target category
    pub category: String,
    /// Target name within its category
    pub name: String,
    /// Target location descriptor
    pub location: String,
    /// Receipt (if resolution succeeded)
    pub receipt: Option<DeploymentReceipt>,
    /// Error message (if resolution failed)
    pub error: Option<String>,
}

impl DeploymentRecord {
    /// Returns true if the target was resolved
    pub fn is_deployed(&self) -> bool {
        self.error.is_none()
    }
}

/// Coordination group status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Revisited by every maintenance tick
    Active,
    /// The maintenance tick has been stopped
    Stopped,
}

/// A ring of subsystem names revisited by the maintenance tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationGroup {
    /// Unique group identifier
    pub id: String,
    /// Ordered ring of subsystem names
    pub members: Vec<String>,
    /// Group status
    pub status: GroupStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last coordination pass
    pub last_coordinated_at: DateTime<Utc>,
    /// Number of ticks that flagged this group for rebalancing
    pub rebalance_count: u64,
}

impl CoordinationGroup {
    /// Creates an active group
    pub fn new(members: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("group-{}", Uuid::new_v4()),
            members,
            status: GroupStatus::Active,
            created_at: now,
            last_coordinated_at: now,
            rebalance_count: 0,
        }
    }

    /// Adjacent pairs around the ring, skipping self pairs
    ///
    /// A ring of length one yields nothing.
    pub fn adjacent_pairs(&self) -> Vec<(&str, &str)> {
        let len = self.members.len();
        (0..len)
            .map(|i| (self.members[i].as_str(), self.members[(i + 1) % len].as_str()))
            .filter(|(current, next)| current != next)
            .collect()
    }

    /// Marks the group as coordinated now
    pub fn touch(&mut self) {
        self.last_coordinated_at = Utc::now();
    }
}
