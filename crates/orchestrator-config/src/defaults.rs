//! Built-in defaults
//!
//! The numeric constants and table contents are arbitrary configuration data.

use std::collections::BTreeMap;

use common::types::ConnectionCategory;

use crate::tables::{CategoryRule, StaticTables, TargetCategory, TargetDescriptor, WeightEntry};

/// Golden ratio
pub const PHI: f64 = 1.618033988749895;

/// Default activation threshold (1 / PHI)
pub const DEFAULT_THRESHOLD: f64 = 1.0 / PHI;

/// Default universal pattern handed to every initialize hook
pub const DEFAULT_PATTERN: &str = "x-_a-_x";

/// Default environment name
pub const DEFAULT_ENVIRONMENT: &str = "local";

/// Default maintenance tick interval (one minute)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 60_000;

/// Default artificial delay per deployment target
pub const DEFAULT_DEPLOYMENT_DELAY_MS: u64 = 100;

/// Default bound on resolving a single deployment target
pub const DEFAULT_DEPLOYMENT_TIMEOUT_MS: u64 = 5_000;

/// Default bound on a single hook call
pub const DEFAULT_HOOK_TIMEOUT_MS: u64 = 5_000;

/// Names of the built-in subsystem set
pub const BUILTIN_SUBSYSTEMS: [&str; 7] = [
    "interface",
    "artifacts",
    "memory_bridge",
    "hub",
    "update_filter",
    "archive",
    "infrastructure",
];

fn names(members: &[&str]) -> Vec<String> {
    members.iter().map(|m| m.to_string()).collect()
}

fn target(name: &str, location: &str) -> TargetDescriptor {
    TargetDescriptor {
        name: name.to_string(),
        location: location.to_string(),
    }
}

/// Default static tables, wired for the built-in subsystem set
pub fn default_tables() -> StaticTables {
    let weights = vec![
        WeightEntry::new("interface", "hub", 1.000),
        WeightEntry::new("memory_bridge", "artifacts", 0.854),
        WeightEntry::new("update_filter", "infrastructure", 0.618),
        WeightEntry::new("archive", "interface", 0.472),
    ];

    let categories = vec![
        CategoryRule {
            category: ConnectionCategory::Bridge,
            members: names(&["interface", "memory_bridge", "archive"]),
        },
        CategoryRule {
            category: ConnectionCategory::DataFlow,
            members: names(&["artifacts", "infrastructure", "update_filter"]),
        },
        CategoryRule {
            category: ConnectionCategory::Coordination,
            members: names(&["hub", "memory_bridge", "update_filter"]),
        },
    ];

    let deployment_targets = vec![
        TargetCategory {
            category: "workspaces".to_string(),
            targets: vec![
                target("professional", "workspace://professional"),
                target("personal", "workspace://personal"),
                target("bridge", "workspace://bridge"),
            ],
        },
        TargetCategory {
            category: "technical_files".to_string(),
            targets: vec![
                target("hooks", "~/.orchestrator/hooks.json"),
                target("bridge", "~/.orchestrator/bridge/"),
                target("processor", "~/.orchestrator/processor"),
            ],
        },
        TargetCategory {
            category: "domains".to_string(),
            targets: vec![
                target("coordination", "coordination.example.org"),
                target("dashboard", "dashboard.example.org/central.html"),
            ],
        },
    ];

    let coordination_groups = vec![
        names(&["memory_bridge", "infrastructure", "artifacts", "hub"]),
        names(&["hub", "update_filter", "interface", "archive"]),
        names(&["archive", "infrastructure", "memory_bridge", "artifacts"]),
    ];

    let connection_matrix: BTreeMap<String, Vec<String>> = [
        ("interface", ["hub", "archive", "infrastructure"]),
        ("artifacts", ["memory_bridge", "infrastructure", "update_filter"]),
        ("memory_bridge", ["hub", "artifacts", "archive"]),
        ("hub", ["interface", "memory_bridge", "update_filter"]),
        ("update_filter", ["hub", "artifacts", "infrastructure"]),
        ("archive", ["interface", "memory_bridge", "infrastructure"]),
        ("infrastructure", ["interface", "artifacts", "update_filter"]),
    ]
    .into_iter()
    .map(|(name, neighbours)| (name.to_string(), names(&neighbours)))
    .collect();

    let pattern_stages: BTreeMap<String, String> = [
        ("fragment", "28% - initial pieces"),
        ("emergence", "56% - pattern recognition"),
        ("closure", "13% - completion phase"),
        ("reopening", "46% - bridge rebuilt"),
    ]
    .into_iter()
    .map(|(stage, description)| (stage.to_string(), description.to_string()))
    .collect();

    StaticTables {
        weights,
        categories,
        deployment_targets,
        coordination_groups,
        connection_matrix,
        pattern_stages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_constant() {
        assert!((DEFAULT_THRESHOLD - 0.618033988749895).abs() < 1e-12);
    }

    #[test]
    fn test_default_tables_reference_builtin_names() {
        let tables = default_tables();
        let known = |name: &String| BUILTIN_SUBSYSTEMS.contains(&name.as_str());

        assert!(tables.weights.iter().all(|w| known(&w.a) && known(&w.b)));
        assert!(tables.coordination_groups.iter().flatten().all(known));
        assert!(tables.connection_matrix.keys().all(known));
        assert_eq!(tables.deployment_target_count(), 8);
    }
}
