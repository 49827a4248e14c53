//! Coordination groups and the maintenance pass
//!
//! The coordinator builds the configured group rings at activation, calls
//! the `coordinate` hook around each ring, and on every maintenance tick
//! refreshes the groups and flags some of them for rebalancing.

use std::sync::Arc;
use std::time::Duration;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use common::models::{CoordinationGroup, GroupStatus};

use crate::metrics::ActivityMetrics;
use crate::random::RandomSource;
use crate::registry::SubsystemRegistry;
use crate::subsystem::Capability;

/// What one maintenance pass did
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Active groups refreshed
    pub groups_visited: usize,
    /// Ids of the groups flagged for rebalancing
    pub flagged: Vec<String>,
    /// Rebalance hooks called
    pub rebalance_calls: usize,
    /// Rebalance hooks that failed
    pub rebalance_failures: usize,
}

/// Coordinator for the group rings
pub struct Coordinator {
    /// Groups formed by the last activation
    groups: RwLock<Vec<CoordinationGroup>>,

    /// Sampler deciding which groups get rebalanced
    random: Mutex<Box<dyn RandomSource>>,

    /// Threshold handed to the hooks and compared against samples
    threshold: f64,

    /// Upper bound per hook call
    hook_timeout: Duration,

    /// Shared activity counters
    metrics: Arc<ActivityMetrics>,
}

impl Coordinator {
    /// Creates a coordinator with no groups
    pub fn new(
        random: Box<dyn RandomSource>,
        threshold: f64,
        hook_timeout: Duration,
        metrics: Arc<ActivityMetrics>,
    ) -> Self {
        Self {
            groups: RwLock::new(Vec::new()),
            random: Mutex::new(random),
            threshold,
            hook_timeout,
            metrics,
        }
    }

    /// Swaps the random source
    pub fn replace_random(&self, random: Box<dyn RandomSource>) {
        *self.random.lock() = random;
    }

    /// Copy of the current groups
    pub fn groups(&self) -> Vec<CoordinationGroup> {
        self.groups.read().clone()
    }

    /// Number of current groups
    pub fn group_count(&self) -> usize {
        self.groups.read().len()
    }

    /// Builds one group per cycle and coordinates each adjacent pair
    ///
    /// Cycles naming an unregistered subsystem are skipped. The new groups
    /// replace any previous ones.
    pub async fn form_groups(&self, registry: &SubsystemRegistry, cycles: &[Vec<String>]) -> Vec<CoordinationGroup> {
        let mut groups = Vec::new();

        for cycle in cycles {
            if cycle.is_empty() {
                continue;
            }

            if let Some(missing) = cycle.iter().find(|name| !registry.contains(name)) {
                warn!("Skipping coordination group {:?}: '{}' is not registered", cycle, missing);
                continue;
            }

            let group = CoordinationGroup::new(cycle.clone());

            for (current, next) in group.adjacent_pairs() {
                let Some(subsystem) = registry.get(current) else {
                    continue;
                };

                match subsystem.coordinate(next, self.threshold, self.hook_timeout).await {
                    Some(Ok(_)) => {
                        debug!("Coordinated {} -> {}", current, next);
                        self.metrics.record_hook(current, Capability::Coordinate, true);
                    }
                    Some(Err(e)) => {
                        warn!("Coordination {} -> {} failed: {}", current, next, e);
                        self.metrics.record_hook(current, Capability::Coordinate, false);
                    }
                    None => trace!("{} has no coordinate hook", current),
                }
            }

            info!("Formed coordination group {} ({} members)", group.id, group.members.len());
            groups.push(group);
        }

        *self.groups.write() = groups.clone();
        groups
    }

    /// One maintenance pass over the active groups
    ///
    /// Every active group is touched and draws one sample; a sample below the
    /// threshold flags the group and calls `rebalance` on each member.
    pub async fn maintain(&self, registry: &SubsystemRegistry) -> TickReport {
        let mut report = TickReport::default();
        let mut to_rebalance = Vec::new();

        {
            let mut groups = self.groups.write();
            let mut random = self.random.lock();

            for group in groups.iter_mut().filter(|g| g.status == GroupStatus::Active) {
                group.touch();
                report.groups_visited += 1;

                let sample = random.next_f64();
                trace!("Group {} drew {:.4}", group.id, sample);

                if sample < self.threshold {
                    group.rebalance_count += 1;
                    report.flagged.push(group.id.clone());
                    to_rebalance.push(group.members.clone());
                    self.metrics.record_rebalance();
                }
            }
        }

        for members in to_rebalance {
            for name in members {
                let Some(subsystem) = registry.get(&name) else {
                    continue;
                };

                if let Some(result) = subsystem.rebalance(self.threshold, self.hook_timeout).await {
                    report.rebalance_calls += 1;
                    let success = result.is_ok();
                    if let Err(e) = result {
                        warn!("Rebalance of {} failed: {}", name, e);
                        report.rebalance_failures += 1;
                    }
                    self.metrics.record_hook(&name, Capability::Rebalance, success);
                }
            }
        }

        self.metrics.record_tick();
        debug!(
            "Maintenance tick: {} groups, {} flagged, {} rebalance calls",
            report.groups_visited,
            report.flagged.len(),
            report.rebalance_calls
        );

        report
    }

    /// Marks every group as stopped
    pub fn stop_groups(&self) {
        for group in self.groups.write().iter_mut() {
            group.status = GroupStatus::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::json;
    use common::models::StatusRecord;

    use crate::random::SequenceRandom;
    use crate::subsystem::Subsystem;

    const THRESHOLD: f64 = 0.618;

    fn coordinator(samples: Vec<f64>) -> Coordinator {
        Coordinator::new(
            Box::new(SequenceRandom::new(samples)),
            THRESHOLD,
            Duration::from_secs(1),
            Arc::new(ActivityMetrics::new()),
        )
    }

    fn recording(name: &str, coordinations: Arc<AtomicUsize>, rebalances: Arc<AtomicUsize>) -> Subsystem {
        Subsystem::new(name, |_, _| async { Ok(StatusRecord::new("ready")) })
            .with_coordinate(move |peer, _| {
                let coordinations = coordinations.clone();
                async move {
                    coordinations.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({ "peer": peer }))
                }
            })
            .with_rebalance(move |_| {
                let rebalances = rebalances.clone();
                async move {
                    rebalances.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
    }

    fn cycle(members: &[&str]) -> Vec<String> {
        members.iter().map(|m| m.to_string()).collect()
    }

    #[tokio::test]
    async fn test_ring_coordinates_each_adjacent_pair() {
        let coordinations = Arc::new(AtomicUsize::new(0));
        let rebalances = Arc::new(AtomicUsize::new(0));
        let registry = SubsystemRegistry::from_subsystems(
            ["a", "b", "c"].map(|n| recording(n, coordinations.clone(), rebalances.clone())),
        )
        .unwrap();

        let groups = coordinator(vec![0.9])
            .form_groups(&registry, &[cycle(&["a", "b", "c"])])
            .await;

        assert_eq!(groups.len(), 1);
        assert_eq!(coordinations.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_single_member_cycle_never_coordinates() {
        let coordinations = Arc::new(AtomicUsize::new(0));
        let rebalances = Arc::new(AtomicUsize::new(0));
        let registry =
            SubsystemRegistry::from_subsystems(vec![recording("solo", coordinations.clone(), rebalances)]).unwrap();

        let groups = coordinator(vec![0.9]).form_groups(&registry, &[cycle(&["solo"])]).await;

        assert_eq!(groups.len(), 1);
        assert_eq!(coordinations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cycle_with_unknown_member_is_skipped() {
        let registry = SubsystemRegistry::from_subsystems(vec![recording(
            "a",
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        )])
        .unwrap();

        let coordinator = coordinator(vec![0.9]);
        let groups = coordinator.form_groups(&registry, &[cycle(&["a", "ghost"])]).await;

        assert!(groups.is_empty());
        assert_eq!(coordinator.group_count(), 0);
    }

    #[tokio::test]
    async fn test_low_sample_triggers_rebalance() {
        let rebalances = Arc::new(AtomicUsize::new(0));
        let registry = SubsystemRegistry::from_subsystems(
            ["a", "b"].map(|n| recording(n, Arc::new(AtomicUsize::new(0)), rebalances.clone())),
        )
        .unwrap();

        let coordinator = coordinator(vec![0.1]);
        coordinator.form_groups(&registry, &[cycle(&["a", "b"])]).await;
        let before = coordinator.groups()[0].last_coordinated_at;

        let report = coordinator.maintain(&registry).await;

        assert_eq!(report.groups_visited, 1);
        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.rebalance_calls, 2);
        assert_eq!(rebalances.load(Ordering::SeqCst), 2);

        let group = &coordinator.groups()[0];
        assert_eq!(group.rebalance_count, 1);
        assert!(group.last_coordinated_at >= before);
    }

    #[tokio::test]
    async fn test_high_sample_skips_rebalance() {
        let rebalances = Arc::new(AtomicUsize::new(0));
        let registry = SubsystemRegistry::from_subsystems(
            ["a", "b"].map(|n| recording(n, Arc::new(AtomicUsize::new(0)), rebalances.clone())),
        )
        .unwrap();

        let coordinator = coordinator(vec![0.9]);
        coordinator.form_groups(&registry, &[cycle(&["a", "b"])]).await;

        let report = coordinator.maintain(&registry).await;

        assert_eq!(report.groups_visited, 1);
        assert!(report.flagged.is_empty());
        assert_eq!(rebalances.load(Ordering::SeqCst), 0);
        assert_eq!(coordinator.groups()[0].rebalance_count, 0);
    }

    #[tokio::test]
    async fn test_sample_equal_to_threshold_skips_rebalance() {
        let registry = SubsystemRegistry::from_subsystems(vec![recording(
            "a",
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        )])
        .unwrap();

        let coordinator = coordinator(vec![THRESHOLD]);
        coordinator.form_groups(&registry, &[cycle(&["a"])]).await;

        assert!(coordinator.maintain(&registry).await.flagged.is_empty());
    }

    #[tokio::test]
    async fn test_stopped_groups_are_not_visited() {
        let registry = SubsystemRegistry::from_subsystems(vec![recording(
            "a",
            Arc::new(AtomicUsize::new(0)),
            Arc::new(AtomicUsize::new(0)),
        )])
        .unwrap();

        let coordinator = coordinator(vec![0.1]);
        coordinator.form_groups(&registry, &[cycle(&["a"])]).await;
        coordinator.stop_groups();

        let report = coordinator.maintain(&registry).await;
        assert_eq!(report.groups_visited, 0);
        assert_eq!(coordinator.groups()[0].status, GroupStatus::Stopped);
    }
}
