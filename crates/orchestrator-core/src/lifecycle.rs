//! Lifecycle management for the orchestrator
//!
//! This module tracks the orchestrator's lifecycle state and owns the
//! heartbeat: the spawned task that drives the periodic maintenance tick.

use std::sync::Arc;
use std::time::Duration;
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::state::OrchestratorState;

/// One maintenance pass, run by the heartbeat on every firing
pub type TickFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

struct RunningTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic timer task
///
/// The first firing happens one interval after `start`. Only `stop` (or
/// dropping the heartbeat) ends the task.
pub struct Heartbeat {
    interval: Duration,
    task: Mutex<Option<RunningTask>>,
}

impl Heartbeat {
    /// Creates a stopped heartbeat
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            task: Mutex::new(None),
        }
    }

    /// Firing interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true while the timer task is alive
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .map(|task| !task.handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawns the timer task, replacing any previous one
    pub async fn start(&self, tick: TickFn) {
        self.stop().await;

        let token = CancellationToken::new();
        let child = token.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                trace!("Heartbeat fired");

                // A pending pass is dropped on cancellation
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = tick() => {}
                }
            }

            debug!("Heartbeat task exited");
        });

        *self.task.lock() = Some(RunningTask { token, handle });
        info!("Heartbeat started (interval: {:?})", interval);
    }

    /// Cancels the timer task and waits for it to exit; no-op when stopped
    pub async fn stop(&self) {
        let task = self.task.lock().take();

        if let Some(RunningTask { token, handle }) = task {
            token.cancel();
            if let Err(e) = handle.await {
                warn!("Heartbeat task ended abnormally: {}", e);
            }
            info!("Heartbeat stopped");
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.token.cancel();
        }
    }
}

/// Lifecycle manager for the orchestrator
pub struct LifecycleManager {
    /// Current state of the orchestrator
    state: RwLock<OrchestratorState>,

    /// Maintenance heartbeat
    heartbeat: Heartbeat,
}

impl LifecycleManager {
    /// Creates a lifecycle manager in the idle state
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            state: RwLock::new(OrchestratorState::new()),
            heartbeat: Heartbeat::new(tick_interval),
        }
    }

    /// Current state
    pub fn state(&self) -> OrchestratorState {
        *self.state.read()
    }

    /// Transitions to a new state
    pub fn transition_to(&self, new_state: OrchestratorState) {
        let mut state = self.state.write();
        if *state != new_state {
            info!("State transition: {} -> {}", *state, new_state);
        }
        *state = new_state;
    }

    /// Maintenance heartbeat
    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    /// Starts the heartbeat and enters `Running`
    pub async fn start(&self, tick: TickFn) {
        self.heartbeat.start(tick).await;
        self.transition_to(OrchestratorState::Running);
    }

    /// Stops the heartbeat and enters `Stopped`
    pub async fn stop(&self) {
        self.heartbeat.stop().await;
        self.transition_to(OrchestratorState::Stopped);
    }
}
