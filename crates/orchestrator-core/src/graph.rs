//! Weighted connection graph
//!
//! Edge weights come from the static weight table. Lookup is symmetric and
//! pairs missing from the table fall back to a fixed default weight. An edge
//! is active only when its weight is strictly above the threshold.

use std::collections::HashMap;
use tracing::trace;

use common::models::ActiveConnection;
use common::types::ConnectionCategory;
use orchestrator_config::{CategoryRule, WeightEntry};

/// Symmetric edge-weight lookup
#[derive(Debug, Clone)]
pub struct WeightTable {
    /// Normalized (lower, higher) pair -> weight
    weights: HashMap<(String, String), f64>,

    /// Weight for pairs missing from the table
    default_weight: f64,
}

fn normalized(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl WeightTable {
    /// Builds the table; later entries for the same pair win
    pub fn from_entries(entries: &[WeightEntry], default_weight: f64) -> Self {
        let weights = entries
            .iter()
            .map(|entry| (normalized(&entry.a, &entry.b), entry.weight))
            .collect();

        Self {
            weights,
            default_weight,
        }
    }

    /// Weight listed for the pair, if any
    pub fn explicit(&self, a: &str, b: &str) -> Option<f64> {
        self.weights.get(&normalized(a, b)).copied()
    }

    /// Weight for the pair, falling back to the default
    pub fn weight(&self, a: &str, b: &str) -> f64 {
        self.explicit(a, b).unwrap_or(self.default_weight)
    }

    /// Weight for pairs missing from the table
    pub fn default_weight(&self) -> f64 {
        self.default_weight
    }
}

/// Assigns categories to connections; the first rule listing both endpoints wins
#[derive(Debug, Clone, Default)]
pub struct CategoryRules {
    rules: Vec<CategoryRule>,
}

impl CategoryRules {
    /// Wraps the configured rules
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Category for a pair of subsystems
    pub fn categorize(&self, a: &str, b: &str) -> ConnectionCategory {
        self.rules
            .iter()
            .find(|rule| {
                rule.members.iter().any(|m| m == a) && rule.members.iter().any(|m| m == b)
            })
            .map(|rule| rule.category)
            .unwrap_or_default()
    }
}

/// A directed pair that passed the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct DirectedEdge {
    /// Source subsystem
    pub source: String,
    /// Target subsystem
    pub target: String,
    /// Edge weight
    pub weight: f64,
}

/// Thresholded connection graph over a set of subsystem names
#[derive(Debug, Clone)]
pub struct ConnectionGraph {
    table: WeightTable,
    categories: CategoryRules,
    threshold: f64,
}

impl ConnectionGraph {
    /// Creates a graph
    pub fn new(table: WeightTable, categories: CategoryRules, threshold: f64) -> Self {
        Self {
            table,
            categories,
            threshold,
        }
    }

    /// Activation threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Weight table
    pub fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Returns true if the weight is strictly above the threshold
    pub fn is_active(&self, weight: f64) -> bool {
        weight > self.threshold
    }

    /// Every ordered pair of distinct names whose weight passes the threshold,
    /// in source-major order
    pub fn retained_edges(&self, names: &[String]) -> Vec<DirectedEdge> {
        let mut edges = Vec::new();

        for source in names {
            for target in names {
                if source == target {
                    continue;
                }

                let weight = self.table.weight(source, target);
                trace!("Edge {} -> {} weight {}", source, target, weight);

                if self.is_active(weight) {
                    edges.push(DirectedEdge {
                        source: source.clone(),
                        target: target.clone(),
                        weight,
                    });
                }
            }
        }

        edges
    }

    /// Active connections, one per unordered pair, `from` being the endpoint registered first
    pub fn active_connections(&self, names: &[String]) -> Vec<ActiveConnection> {
        let mut connections = Vec::new();

        for (i, from) in names.iter().enumerate() {
            for to in &names[i + 1..] {
                if from == to {
                    continue;
                }

                let weight = self.table.weight(from, to);
                if self.is_active(weight) {
                    connections.push(ActiveConnection {
                        from: from.clone(),
                        to: to.clone(),
                        weight,
                        category: self.categories.categorize(from, to),
                    });
                }
            }
        }

        connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.618;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|n| n.to_string()).collect()
    }

    fn abc_graph() -> ConnectionGraph {
        let table = WeightTable::from_entries(
            &[
                WeightEntry::new("A", "B", 0.9),
                WeightEntry::new("B", "C", 0.5),
                WeightEntry::new("A", "C", 0.618),
            ],
            THRESHOLD * THRESHOLD,
        );
        ConnectionGraph::new(table, CategoryRules::default(), THRESHOLD)
    }

    #[test]
    fn test_weight_lookup_is_symmetric() {
        let graph = abc_graph();
        let all = names(&["A", "B", "C", "D"]);

        for a in &all {
            for b in &all {
                assert_eq!(graph.table().weight(a, b), graph.table().weight(b, a));
            }
        }
        assert_eq!(graph.table().explicit("C", "B"), Some(0.5));
        assert_eq!(graph.table().weight("A", "D"), THRESHOLD * THRESHOLD);
    }

    #[test]
    fn test_abc_scenario_yields_single_connection() {
        let graph = abc_graph();
        let connections = graph.active_connections(&names(&["A", "B", "C"]));

        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].from, "A");
        assert_eq!(connections[0].to, "B");
        assert_eq!(connections[0].weight, 0.9);
        assert_eq!(connections[0].category, ConnectionCategory::Universal);
    }

    #[test]
    fn test_retained_edges_cover_both_directions() {
        let graph = abc_graph();
        let edges = graph.retained_edges(&names(&["A", "B", "C"]));

        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "B"), ("B", "A")]);
    }

    #[test]
    fn test_threshold_boundary_is_strict() {
        let threshold = 0.5;
        let table = WeightTable::from_entries(
            &[
                WeightEntry::new("at", "edge", threshold),
                WeightEntry::new("above", "edge", threshold + f64::EPSILON),
            ],
            0.0,
        );
        let graph = ConnectionGraph::new(table, CategoryRules::default(), threshold);

        assert!(!graph.is_active(threshold));
        assert!(graph.is_active(threshold + f64::EPSILON));

        let connections = graph.active_connections(&names(&["at", "above", "edge"]));
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].from, "above");
    }

    #[test]
    fn test_default_weight_above_threshold_connects_everything() {
        let graph = ConnectionGraph::new(
            WeightTable::from_entries(&[], 0.9),
            CategoryRules::default(),
            0.5,
        );

        let connections = graph.active_connections(&names(&["a", "b", "c"]));
        assert_eq!(connections.len(), 3);
        assert_eq!(graph.retained_edges(&names(&["a", "b", "c"])).len(), 6);
    }

    #[test]
    fn test_first_matching_category_wins() {
        let rules = CategoryRules::new(vec![
            CategoryRule {
                category: ConnectionCategory::Bridge,
                members: names(&["a", "b"]),
            },
            CategoryRule {
                category: ConnectionCategory::Coordination,
                members: names(&["a", "b", "c"]),
            },
        ]);

        assert_eq!(rules.categorize("b", "a"), ConnectionCategory::Bridge);
        assert_eq!(rules.categorize("a", "c"), ConnectionCategory::Coordination);
        assert_eq!(rules.categorize("a", "z"), ConnectionCategory::Universal);
    }
}
