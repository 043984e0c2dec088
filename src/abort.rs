//! Abort signalling and the abort watcher.
//!
//! Cancellation is an explicit token ([`AbortSignal`]) handed to the engine,
//! not process-global state; OS signals are only one possible source of a
//! trigger ([`SignalHandler`]). The [`AbortWatcher`] waits on the token and
//! best-effort reverts every target, going through the same per-target slot
//! locks as the injection strategies.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::events::{ChaosEvent, EventSink};
use crate::lifecycle::Lifecycle;
use crate::types::TargetSlot;

/// Cloneable cancellation token.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl AbortSignal {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Trigger the abort. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the abort has been triggered.
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Bridges OS termination signals to an [`AbortSignal`].
pub struct SignalHandler {
    abort: AbortSignal,
}

impl SignalHandler {
    pub fn new(abort: AbortSignal) -> Self {
        Self { abort }
    }

    /// Spawn the listener task. Triggers the abort on SIGINT or SIGTERM.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};

                let mut sigterm = match signal(SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(e) => {
                        error!(error = %e, "failed to install SIGTERM handler");
                        return;
                    }
                };

                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
            }
            #[cfg(not(unix))]
            {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("received interrupt");
                }
            }
            self.abort.trigger();
        })
    }
}

/// Waits for an abort and reverts every target, best effort.
///
/// Revert failures are logged, never propagated: one broken target must not
/// leave the others injected.
pub struct AbortWatcher {
    lifecycle: Arc<Lifecycle>,
    slots: Vec<Arc<TargetSlot>>,
    events: Arc<dyn EventSink>,
    abort: AbortSignal,
}

impl AbortWatcher {
    pub fn new(
        lifecycle: Arc<Lifecycle>,
        slots: Vec<Arc<TargetSlot>>,
        events: Arc<dyn EventSink>,
        abort: AbortSignal,
    ) -> Self {
        Self {
            lifecycle,
            slots,
            events,
            abort,
        }
    }

    /// Block until the abort triggers, then sweep all targets.
    pub async fn run(self) {
        self.abort.triggered().await;
        warn!("abort received, reverting chaos");
        self.events.notify(ChaosEvent::AbortStarted).await;

        for slot in &self.slots {
            if let Err(e) = self.lifecycle.revert(slot).await {
                error!(target = %slot.target.id, error = %e, "abort revert failed");
            }
        }

        self.events.notify(ChaosEvent::AbortCompleted).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MemoryAdapter, ResourceAction};
    use crate::events::LogSink;
    use crate::lifecycle::FaultProfile;
    use crate::poller::RetryPoller;
    use crate::types::{ResourceState, Target, TargetKind, TargetPhase};
    use std::time::Duration;

    fn disk_lifecycle(adapter: Arc<MemoryAdapter>) -> Arc<Lifecycle> {
        Arc::new(Lifecycle::new(
            adapter,
            FaultProfile {
                kind: TargetKind::Disk,
                inject: ResourceAction::Detach,
                launch: None,
                restore: Some(ResourceAction::Attach),
                injected_state: Some(ResourceState::from("detached")),
                healthy_state: Some(ResourceState::from("attached")),
                watch_abort: true,
                single_shot_parallel: false,
            },
            RetryPoller::new(3, Duration::from_millis(1)),
            Arc::new(LogSink),
        ))
    }

    #[tokio::test]
    async fn trigger_resolves_waiters() {
        let abort = AbortSignal::new();
        let waiter = {
            let abort = abort.clone();
            tokio::spawn(async move { abort.triggered().await })
        };
        abort.trigger();
        waiter.await.unwrap();
        assert!(abort.is_triggered());
    }

    #[tokio::test]
    async fn watcher_reverts_injected_and_skips_untouched() {
        let adapter = MemoryAdapter::new(ResourceState::from("attached"));
        let lifecycle = disk_lifecycle(Arc::clone(&adapter));
        let injected = TargetSlot::new(Target::new("disk-1", TargetKind::Disk));
        let untouched = TargetSlot::new(Target::new("disk-2", TargetKind::Disk));

        lifecycle.inject(&injected).await.unwrap();

        let abort = AbortSignal::new();
        let watcher = AbortWatcher::new(
            lifecycle,
            vec![Arc::clone(&injected), Arc::clone(&untouched)],
            Arc::new(LogSink),
            abort.clone(),
        );
        abort.trigger();
        watcher.run().await;

        assert_eq!(injected.phase().await, TargetPhase::Reverted);
        assert_eq!(untouched.phase().await, TargetPhase::Reverted);
        // the untouched disk is only queried, never attached
        assert!(!adapter.call_log().await.contains(&"attach disk-2".to_string()));
    }

    #[tokio::test]
    async fn watcher_continues_past_failing_target() {
        let adapter = MemoryAdapter::new(ResourceState::from("attached"));
        let lifecycle = disk_lifecycle(Arc::clone(&adapter));
        let broken = TargetSlot::new(Target::new("disk-1", TargetKind::Disk));
        let healthy_after = TargetSlot::new(Target::new("disk-2", TargetKind::Disk));

        lifecycle.inject(&broken).await.unwrap();
        lifecycle.inject(&healthy_after).await.unwrap();
        adapter.fail_next_mutate("disk-1", "vcenter unreachable").await;

        let abort = AbortSignal::new();
        let watcher = AbortWatcher::new(
            lifecycle,
            vec![Arc::clone(&broken), Arc::clone(&healthy_after)],
            Arc::new(LogSink),
            abort.clone(),
        );
        abort.trigger();
        watcher.run().await;

        assert_eq!(broken.phase().await, TargetPhase::Failed);
        assert_eq!(healthy_after.phase().await, TargetPhase::Reverted);
    }
}
