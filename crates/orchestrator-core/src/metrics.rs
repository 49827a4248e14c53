//! Activity metrics for the orchestrator
//!
//! Counts hook calls and failures per subsystem, plus activations,
//! maintenance ticks and rebalances. Snapshots are serializable and feed the
//! status report.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::subsystem::Capability;

/// Call counters for a single `subsystem.hook` key
#[derive(Debug, Default)]
struct HookCounters {
    calls: AtomicU64,
    failures: AtomicU64,
}

/// Call and failure counts for one hook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookStats {
    /// Number of calls
    pub calls: u64,
    /// Number of failed calls
    pub failures: u64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Completed activations
    pub activations: u64,
    /// Maintenance ticks run
    pub ticks: u64,
    /// Groups flagged for rebalancing across all ticks
    pub rebalances: u64,
    /// `subsystem.hook` -> counts
    pub hooks: BTreeMap<String, HookStats>,
}

impl MetricsSnapshot {
    /// Total failed hook calls
    pub fn total_failures(&self) -> u64 {
        self.hooks.values().map(|s| s.failures).sum()
    }
}

/// Lock-free activity counters
#[derive(Debug, Default)]
pub struct ActivityMetrics {
    hooks: DashMap<String, HookCounters>,
    activations: AtomicU64,
    ticks: AtomicU64,
    rebalances: AtomicU64,
}

impl ActivityMetrics {
    /// Creates empty counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one hook call and whether it succeeded
    pub fn record_hook(&self, subsystem: &str, capability: Capability, success: bool) {
        let key = format!("{}.{}", subsystem, capability);
        let counters = self.hooks.entry(key).or_default();
        counters.calls.fetch_add(1, Ordering::Relaxed);
        if !success {
            counters.failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records a completed activation
    pub fn record_activation(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a maintenance tick
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a group flagged for rebalancing
    pub fn record_rebalance(&self) {
        self.rebalances.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of maintenance ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Copies the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let hooks = self
            .hooks
            .iter()
            .map(|entry| {
                let stats = HookStats {
                    calls: entry.value().calls.load(Ordering::Relaxed),
                    failures: entry.value().failures.load(Ordering::Relaxed),
                };
                (entry.key().clone(), stats)
            })
            .collect();

        MetricsSnapshot {
            activations: self.activations.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            rebalances: self.rebalances.load(Ordering::Relaxed),
            hooks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_counters() {
        let metrics = ActivityMetrics::new();
        metrics.record_hook("hub", Capability::Connect, true);
        metrics.record_hook("hub", Capability::Connect, false);
        metrics.record_hook("archive", Capability::Rebalance, true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hooks["hub.connect"], HookStats { calls: 2, failures: 1 });
        assert_eq!(snapshot.hooks["archive.rebalance"], HookStats { calls: 1, failures: 0 });
        assert_eq!(snapshot.total_failures(), 1);
    }

    #[test]
    fn test_lifecycle_counters() {
        let metrics = ActivityMetrics::new();
        metrics.record_activation();
        metrics.record_tick();
        metrics.record_tick();
        metrics.record_rebalance();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.activations, 1);
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.rebalances, 1);
        assert_eq!(metrics.ticks(), 2);
    }
}
