//! Static configuration tables
//!
//! These tables are plain data consumed at activation: the edge-weight table,
//! category rules, deployment targets, coordination group cycles, the
//! connection matrix and the pattern stages.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use common::types::ConnectionCategory;

/// One undirected entry of the edge-weight table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// First endpoint
    pub a: String,
    /// Second endpoint
    pub b: String,
    /// Connection weight in [0, 1]
    pub weight: f64,
}

impl WeightEntry {
    /// Creates a weight entry
    pub fn new(a: impl Into<String>, b: impl Into<String>, weight: f64) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            weight,
        }
    }
}

/// Category assigned when both endpoints are listed in `members`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Category to assign
    pub category: ConnectionCategory,
    /// Subsystems belonging to the category
    pub members: Vec<String>,
}

/// A single deployment target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDescriptor {
    /// Target name within its category
    pub name: String,
    /// Location descriptor handed to the resolver
    pub location: String,
}

/// A named category of deployment targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetCategory {
    /// Category name
    pub category: String,
    /// Targets in table order
    pub targets: Vec<TargetDescriptor>,
}

/// All static tables consumed at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTables {
    /// Edge-weight table
    pub weights: Vec<WeightEntry>,

    /// Category rules, first match wins
    pub categories: Vec<CategoryRule>,

    /// Deployment-target table
    pub deployment_targets: Vec<TargetCategory>,

    /// Coordination group cycles
    pub coordination_groups: Vec<Vec<String>>,

    /// Subsystem -> neighbour list, reported in status snapshots
    pub connection_matrix: BTreeMap<String, Vec<String>>,

    /// Stage name -> description, handed to the pattern hooks
    pub pattern_stages: BTreeMap<String, String>,
}

impl StaticTables {
    /// Tables with no entries at all
    pub fn empty() -> Self {
        Self {
            weights: Vec::new(),
            categories: Vec::new(),
            deployment_targets: Vec::new(),
            coordination_groups: Vec::new(),
            connection_matrix: BTreeMap::new(),
            pattern_stages: BTreeMap::new(),
        }
    }

    /// Total number of deployment targets across all categories
    pub fn deployment_target_count(&self) -> usize {
        self.deployment_targets.iter().map(|c| c.targets.len()).sum()
    }
}

impl Default for StaticTables {
    fn default() -> Self {
        crate::defaults::default_tables()
    }
}
