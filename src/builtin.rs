//! Built-in demonstration subsystems
//!
//! Seven stub subsystems wired to the default static tables. Each answers its
//! hooks with a fixed acknowledgement. Only `interface` and `archive` take
//! part in the pattern pass and none of them rebalance.

use serde_json::json;

use common::models::StatusRecord;
use orchestrator_core::Subsystem;

/// Peer systems the hub reports bridging to
const HUB_PEERS: [&str; 5] = ["alpha", "beta", "gamma", "delta", "epsilon"];

/// Artifact count reported by the artifact store
const ARTIFACT_COUNT: u64 = 44;

/// Every built-in subsystem, in registration order
pub fn builtin_subsystems() -> Vec<Subsystem> {
    vec![
        interface(),
        artifacts(),
        memory_bridge(),
        hub(),
        update_filter(),
        archive(),
        infrastructure(),
    ]
}

fn interface() -> Subsystem {
    Subsystem::new("interface", |_, pattern| async move {
        Ok(StatusRecord::new("interface active").with_detail("pattern", pattern))
    })
    .with_connect(|_, weight| async move { Ok(json!({ "connected": true, "weight": weight })) })
    .with_receive_connection(|_, weight| async move { Ok(json!({ "received": true, "weight": weight })) })
    .with_coordinate(|_, threshold| async move { Ok(json!({ "coordinated": true, "threshold": threshold })) })
    .with_apply_pattern(|stages| async move { Ok(json!({ "applied": true, "stages": stages })) })
}

fn artifacts() -> Subsystem {
    Subsystem::new("artifacts", |_, pattern| async move {
        Ok(StatusRecord::new("artifact store active")
            .with_detail("count", ARTIFACT_COUNT)
            .with_detail("pattern", pattern))
    })
    .with_connect(|_, _| async { Ok(json!({ "connected": true, "artifacts": ARTIFACT_COUNT })) })
    .with_receive_connection(|_, _| async { Ok(json!({ "received": true })) })
    .with_coordinate(|_, _| async { Ok(json!({ "coordinated": true })) })
}

fn memory_bridge() -> Subsystem {
    Subsystem::new("memory_bridge", |threshold, _| async move {
        Ok(StatusRecord::new("memory bridge active").with_detail("threshold", threshold))
    })
    .with_connect(|_, _| async { Ok(json!({ "bridged": true, "scope": "all" })) })
    .with_receive_connection(|_, _| async { Ok(json!({ "inherited": true })) })
    .with_coordinate(|_, _| async { Ok(json!({ "linked": true })) })
}

fn hub() -> Subsystem {
    Subsystem::new("hub", |_, _| async {
        Ok(StatusRecord::new("hub active").with_detail("systems", HUB_PEERS.len()))
    })
    .with_connect(|_, _| async { Ok(json!({ "bridged": HUB_PEERS })) })
    .with_receive_connection(|_, _| async { Ok(json!({ "inherited": true })) })
    .with_coordinate(|_, _| async { Ok(json!({ "cross_system": true })) })
}

fn update_filter() -> Subsystem {
    Subsystem::new("update_filter", |threshold, _| async move {
        Ok(StatusRecord::new("update filter active").with_detail("threshold", threshold))
    })
    .with_connect(|_, weight| async move {
        Ok(json!({ "filtered": weight > orchestrator_config::defaults::DEFAULT_THRESHOLD }))
    })
    .with_receive_connection(|_, _| async { Ok(json!({ "update_received": true })) })
    .with_coordinate(|_, _| async { Ok(json!({ "coordinated": true })) })
}

fn archive() -> Subsystem {
    Subsystem::new("archive", |_, pattern| async move {
        Ok(StatusRecord::new("archive active").with_detail("pattern", pattern))
    })
    .with_connect(|target, _| async move { Ok(json!({ "indexed": target })) })
    .with_receive_connection(|_, _| async { Ok(json!({ "archived": true })) })
    .with_coordinate(|_, _| async { Ok(json!({ "archive_active": true })) })
    .with_apply_pattern(|stages| async move {
        Ok(json!({ "pattern_applied": stages.keys().cloned().collect::<Vec<_>>() }))
    })
}

fn infrastructure() -> Subsystem {
    Subsystem::new("infrastructure", |_, _| async {
        Ok(StatusRecord::new("infrastructure ready")
            .with_detail("domains_ready", true)
            .with_detail("repositories_ready", true))
    })
    .with_connect(|_, _| async { Ok(json!({ "deployed": true })) })
    .with_receive_connection(|_, _| async { Ok(json!({ "ready": true })) })
    .with_coordinate(|_, _| async { Ok(json!({ "coordinated": true })) })
}
