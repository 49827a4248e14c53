//! Subsystem capability interface
//!
//! A subsystem is a named unit with a required initialize hook and a set of
//! optional hooks. Optional hooks are explicit `Option` fields, so the
//! orchestrator checks for a capability instead of probing for methods.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use common::error::{Error, Result};
use common::models::{Ack, StatusRecord};
use common::utils::execute_with_timeout;

/// Future returned by every hook
pub type HookFuture<T> = BoxFuture<'static, anyhow::Result<T>>;

/// Stage name -> description, handed to the pattern hook
pub type PatternStages = BTreeMap<String, String>;

/// `initialize(threshold, pattern)`
pub type InitializeHook = Arc<dyn Fn(f64, String) -> HookFuture<StatusRecord> + Send + Sync>;

/// Hooks that take a peer name and a weight or threshold
pub type PeerHook = Arc<dyn Fn(String, f64) -> HookFuture<Ack> + Send + Sync>;

/// `rebalance(threshold)`
pub type RebalanceHook = Arc<dyn Fn(f64) -> HookFuture<()> + Send + Sync>;

/// `apply_pattern(stages)`
pub type PatternHook = Arc<dyn Fn(PatternStages) -> HookFuture<Value> + Send + Sync>;

/// Names of the hooks a subsystem can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Required initialize hook
    Initialize,
    /// Outgoing connection hook
    Connect,
    /// Incoming connection hook
    ReceiveConnection,
    /// Ring coordination hook
    Coordinate,
    /// Maintenance rebalance hook
    Rebalance,
    /// Pattern pass hook
    ApplyPattern,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Initialize => "initialize",
            Capability::Connect => "connect",
            Capability::ReceiveConnection => "receive_connection",
            Capability::Coordinate => "coordinate",
            Capability::Rebalance => "rebalance",
            Capability::ApplyPattern => "apply_pattern",
        };
        write!(f, "{}", name)
    }
}

/// Optional hooks
#[derive(Clone, Default)]
pub struct Capabilities {
    /// Outgoing connection hook
    pub connect: Option<PeerHook>,
    /// Incoming connection hook
    pub receive_connection: Option<PeerHook>,
    /// Ring coordination hook
    pub coordinate: Option<PeerHook>,
    /// Maintenance rebalance hook
    pub rebalance: Option<RebalanceHook>,
    /// Pattern pass hook
    pub apply_pattern: Option<PatternHook>,
}

/// A registered unit of work
#[derive(Clone)]
pub struct Subsystem {
    name: String,
    initialize: InitializeHook,
    capabilities: Capabilities,
}

fn peer_hook<F, Fut>(hook: F) -> PeerHook
where
    F: Fn(String, f64) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Ack>> + Send + 'static,
{
    Arc::new(move |peer, value| hook(peer, value).boxed())
}

impl Subsystem {
    /// Creates a subsystem with only the required initialize hook
    pub fn new<F, Fut>(name: impl Into<String>, initialize: F) -> Self
    where
        F: Fn(f64, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<StatusRecord>> + Send + 'static,
    {
        Self {
            name: name.into(),
            initialize: Arc::new(move |threshold, pattern| initialize(threshold, pattern).boxed()),
            capabilities: Capabilities::default(),
        }
    }

    /// Adds the outgoing connection hook
    pub fn with_connect<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(String, f64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Ack>> + Send + 'static,
    {
        self.capabilities.connect = Some(peer_hook(hook));
        self
    }

    /// Adds the incoming connection hook
    pub fn with_receive_connection<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(String, f64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Ack>> + Send + 'static,
    {
        self.capabilities.receive_connection = Some(peer_hook(hook));
        self
    }

    /// Adds the ring coordination hook
    pub fn with_coordinate<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(String, f64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Ack>> + Send + 'static,
    {
        self.capabilities.coordinate = Some(peer_hook(hook));
        self
    }

    /// Adds the maintenance rebalance hook
    pub fn with_rebalance<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(f64) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.capabilities.rebalance = Some(Arc::new(move |threshold| hook(threshold).boxed()));
        self
    }

    /// Adds the pattern pass hook
    pub fn with_apply_pattern<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(PatternStages) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.capabilities.apply_pattern = Some(Arc::new(move |stages| hook(stages).boxed()));
        self
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional hooks
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Every hook this subsystem exposes, `Initialize` included
    pub fn capability_list(&self) -> Vec<Capability> {
        let caps = &self.capabilities;
        let mut list = vec![Capability::Initialize];
        if caps.connect.is_some() {
            list.push(Capability::Connect);
        }
        if caps.receive_connection.is_some() {
            list.push(Capability::ReceiveConnection);
        }
        if caps.coordinate.is_some() {
            list.push(Capability::Coordinate);
        }
        if caps.rebalance.is_some() {
            list.push(Capability::Rebalance);
        }
        if caps.apply_pattern.is_some() {
            list.push(Capability::ApplyPattern);
        }
        list
    }

    /// Runs the initialize hook
    pub async fn initialize(&self, threshold: f64, pattern: &str, timeout: Duration) -> Result<StatusRecord> {
        let hook = self.initialize.clone();
        let pattern = pattern.to_string();
        let future = guard_call(move || hook(threshold, pattern));

        run_hook(&self.name, Capability::Initialize, timeout, future)
            .await
            .map_err(|e| Error::Initialization {
                subsystem: self.name.clone(),
                reason: match e {
                    Error::Hook { reason, .. } => reason,
                    other => other.to_string(),
                },
            })
    }

    /// Runs the connect hook, `None` when absent
    pub async fn connect(&self, target: &str, weight: f64, timeout: Duration) -> Option<Result<Ack>> {
        let hook = self.capabilities.connect.clone()?;
        Some(self.call_peer(Capability::Connect, hook, target, weight, timeout).await)
    }

    /// Runs the receive-connection hook, `None` when absent
    pub async fn receive_connection(&self, source: &str, weight: f64, timeout: Duration) -> Option<Result<Ack>> {
        let hook = self.capabilities.receive_connection.clone()?;
        Some(self.call_peer(Capability::ReceiveConnection, hook, source, weight, timeout).await)
    }

    /// Runs the coordinate hook, `None` when absent
    pub async fn coordinate(&self, peer: &str, threshold: f64, timeout: Duration) -> Option<Result<Ack>> {
        let hook = self.capabilities.coordinate.clone()?;
        Some(self.call_peer(Capability::Coordinate, hook, peer, threshold, timeout).await)
    }

    /// Runs the rebalance hook, `None` when absent
    pub async fn rebalance(&self, threshold: f64, timeout: Duration) -> Option<Result<()>> {
        let hook = self.capabilities.rebalance.clone()?;
        let future = guard_call(move || hook(threshold));
        Some(run_hook(&self.name, Capability::Rebalance, timeout, future).await)
    }

    /// Runs the pattern hook, `None` when absent
    pub async fn apply_pattern(&self, stages: &PatternStages, timeout: Duration) -> Option<Result<Value>> {
        let hook = self.capabilities.apply_pattern.clone()?;
        let stages = stages.clone();
        let future = guard_call(move || hook(stages));
        Some(run_hook(&self.name, Capability::ApplyPattern, timeout, future).await)
    }

    async fn call_peer(
        &self,
        capability: Capability,
        hook: PeerHook,
        peer: &str,
        value: f64,
        timeout: Duration,
    ) -> Result<Ack> {
        let peer = peer.to_string();
        let future = guard_call(move || hook(peer, value));
        run_hook(&self.name, capability, timeout, future).await
    }
}

impl fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem")
            .field("name", &self.name)
            .field("capabilities", &self.capability_list())
            .finish()
    }
}

/// Calls a hook, turning a panic during the call itself into a failed future
fn guard_call<T, F>(call: F) -> HookFuture<T>
where
    T: Send + 'static,
    F: FnOnce() -> HookFuture<T>,
{
    match std::panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(future) => future,
        Err(_) => futures::future::ready(Err(anyhow::anyhow!("hook panicked"))).boxed(),
    }
}

/// Awaits a hook future under the timeout, catching panics while it runs
async fn run_hook<T>(subsystem: &str, capability: Capability, timeout: Duration, future: HookFuture<T>) -> Result<T> {
    let guarded = async {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Error::hook(subsystem, capability.to_string(), format!("{:#}", e))),
            Err(_) => Err(Error::hook(subsystem, capability.to_string(), "hook panicked")),
        }
    };

    execute_with_timeout(guarded, timeout, &format!("{}.{}", subsystem, capability)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn minimal(name: &str) -> Subsystem {
        Subsystem::new(name, |_, _| async { Ok(StatusRecord::new("ready")) })
    }

    #[tokio::test]
    async fn test_missing_optional_hooks_return_none() {
        let subsystem = minimal("bare");

        assert_eq!(subsystem.capability_list(), vec![Capability::Initialize]);
        assert!(subsystem.connect("peer", 0.9, TIMEOUT).await.is_none());
        assert!(subsystem.receive_connection("peer", 0.9, TIMEOUT).await.is_none());
        assert!(subsystem.coordinate("peer", 0.6, TIMEOUT).await.is_none());
        assert!(subsystem.rebalance(0.6, TIMEOUT).await.is_none());
        assert!(subsystem.apply_pattern(&PatternStages::new(), TIMEOUT).await.is_none());
    }

    #[tokio::test]
    async fn test_initialize_receives_arguments() {
        let subsystem = Subsystem::new("echo", |threshold, pattern| async move {
            Ok(StatusRecord::new("ready")
                .with_detail("threshold", threshold)
                .with_detail("pattern", pattern))
        });

        let status = subsystem.initialize(0.5, "x-_a-_x", TIMEOUT).await.unwrap();
        assert_eq!(status.details["threshold"], json!(0.5));
        assert_eq!(status.details["pattern"], json!("x-_a-_x"));
    }

    #[tokio::test]
    async fn test_initialize_failure_becomes_initialization_error() {
        let subsystem = Subsystem::new("broken", |_, _| async { anyhow::bail!("disk on fire") });

        let err = subsystem.initialize(0.5, "p", TIMEOUT).await.unwrap_err();
        assert!(err.is_initialization());
        assert!(err.to_string().contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_panicking_hooks_are_contained() {
        let subsystem = minimal("panicky")
            .with_connect(|_, _| -> futures::future::Ready<anyhow::Result<Ack>> {
                panic!("synchronous panic")
            })
            .with_rebalance(|threshold| async move {
                if threshold > 0.0 {
                    panic!("async panic");
                }
                Ok(())
            });

        let connect = subsystem.connect("peer", 0.9, TIMEOUT).await.unwrap();
        assert!(connect.unwrap_err().to_string().contains("panicked"));

        let rebalance = subsystem.rebalance(0.6, TIMEOUT).await.unwrap();
        assert!(rebalance.is_err());
    }

    #[tokio::test]
    async fn test_slow_hook_times_out() {
        let subsystem = minimal("slow").with_coordinate(|_, _| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(json!({ "coordinated": true }))
        });

        let result = subsystem
            .coordinate("peer", 0.6, Duration::from_millis(20))
            .await
            .unwrap();
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn test_peer_hooks_receive_peer_name() {
        let subsystem = minimal("hub")
            .with_connect(|target, weight| async move { Ok(json!({ "to": target, "weight": weight })) });

        let ack = subsystem.connect("archive", 0.75, TIMEOUT).await.unwrap().unwrap();
        assert_eq!(ack, json!({ "to": "archive", "weight": 0.75 }));
        assert_eq!(
            subsystem.capability_list(),
            vec![Capability::Initialize, Capability::Connect]
        );
    }
}
