//! Per-target fault lifecycle.
//!
//! A [`FaultProfile`] describes one fault kind declaratively: which adapter
//! action injects it, which (if any) reverts it, and which resource states
//! mark the fault as applied and as healed. [`Lifecycle`] executes that
//! profile against a single target, advancing the slot phase under the slot
//! lock so that strategies and the abort watcher never mutate the same
//! target concurrently.
//!
//! The four operations are split so the parallel strategy can run them as
//! passes over the whole target list (mutate all, then converge all); the
//! serial strategy and the abort path use the combined [`Lifecycle::inject`]
//! and [`Lifecycle::revert`].

use std::sync::Arc;
use tracing::{debug, info};

use crate::adapter::{ResourceAction, ResourceAdapter};
use crate::error::{FaultlineError, Result};
use crate::events::{ChaosEvent, EventSink};
use crate::poller::RetryPoller;
use crate::types::{ResourceState, Target, TargetKind, TargetPhase, TargetSlot};

/// Declarative description of one fault kind.
#[derive(Debug, Clone)]
pub struct FaultProfile {
    pub kind: TargetKind,
    /// Action that applies the fault.
    pub inject: ResourceAction,
    /// Optional second action spawned detached right after `inject`
    /// (script execution); its handle is awaited at revert time.
    pub launch: Option<ResourceAction>,
    /// Action that undoes the fault. `None` for faults that are not
    /// reverted (process kill) or that heal on their own.
    pub restore: Option<ResourceAction>,
    /// State that confirms the fault took hold; `None` skips the
    /// convergence wait after injection.
    pub injected_state: Option<ResourceState>,
    /// State that confirms recovery; polled after `restore`, or on its own
    /// for self-healing faults.
    pub healthy_state: Option<ResourceState>,
    /// Whether the engine arms the abort watcher for this fault.
    pub watch_abort: bool,
    /// Parallel mode applies this fault once per run rather than looping
    /// rounds until the window elapses.
    pub single_shot_parallel: bool,
}

/// Executes a [`FaultProfile`] against individual targets.
pub struct Lifecycle {
    adapter: Arc<dyn ResourceAdapter>,
    profile: FaultProfile,
    poller: RetryPoller,
    events: Arc<dyn EventSink>,
}

impl Lifecycle {
    pub fn new(
        adapter: Arc<dyn ResourceAdapter>,
        profile: FaultProfile,
        poller: RetryPoller,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            adapter,
            profile,
            poller,
            events,
        }
    }

    pub fn profile(&self) -> &FaultProfile {
        &self.profile
    }

    /// Capture resource-specific revert data before the first mutation.
    ///
    /// Only meaningful for faults that restore explicitly; the adapter keeps
    /// whatever it needs (e.g. a disk's backing path) on its side.
    pub async fn capture_context(&self, slot: &TargetSlot) -> Result<()> {
        if self.profile.restore.is_some() {
            let ctx = self.adapter.capture_revert_context(&slot.target).await?;
            if !ctx.is_empty() {
                debug!(target = %slot.target.id, entries = ctx.len(), "captured revert context");
            }
        }
        Ok(())
    }

    /// Apply the fault mutation to one target.
    pub async fn inject_fault(&self, slot: &TargetSlot) -> Result<()> {
        let mut state = slot.state.lock().await;
        if state.phase == TargetPhase::Injected {
            return Ok(());
        }

        state.phase = TargetPhase::Injecting;
        info!(
            target = %slot.target.id,
            kind = %slot.target.kind,
            action = %self.profile.inject,
            "injecting fault"
        );

        if let Err(e) = self.adapter.mutate(&slot.target, self.profile.inject).await {
            state.phase = TargetPhase::Failed;
            return Err(e);
        }

        if let Some(launch) = self.profile.launch {
            let adapter = Arc::clone(&self.adapter);
            let target = slot.target.clone();
            state.launch = Some(tokio::spawn(async move {
                adapter.mutate(&target, launch).await
            }));
        }
        Ok(())
    }

    /// Wait until the fault has observably taken hold.
    pub async fn await_injected(&self, slot: &TargetSlot) -> Result<()> {
        let mut state = slot.state.lock().await;
        if state.phase != TargetPhase::Injecting {
            return Ok(());
        }

        if let Some(expected) = &self.profile.injected_state {
            if let Err(e) = self.await_state(&slot.target, expected).await {
                state.phase = TargetPhase::Failed;
                return Err(e);
            }
        }

        state.phase = TargetPhase::Injected;
        self.events
            .notify(ChaosEvent::TargetInjected {
                target: slot.target.id.clone(),
                kind: slot.target.kind.to_string(),
            })
            .await;
        Ok(())
    }

    /// Apply the restore mutation (and collect a detached launch).
    ///
    /// Reverting is conditional: the target is queried first and the
    /// mutation skipped when it already reports healthy, so reverting an
    /// untouched or externally-healed target is a no-op.
    pub async fn revert_fault(&self, slot: &TargetSlot) -> Result<()> {
        let mut state = slot.state.lock().await;
        if state.phase == TargetPhase::Reverted {
            return Ok(());
        }

        if state.launch.is_none() {
            if let Some(healthy) = &self.profile.healthy_state {
                if let Ok(current) = self.adapter.query(&slot.target).await {
                    if current == *healthy {
                        info!(
                            target = %slot.target.id,
                            state = %current,
                            "[Skip]: target already in healthy state"
                        );
                        state.phase = TargetPhase::Reverted;
                        return Ok(());
                    }
                }
            }
        }

        state.phase = TargetPhase::Reverting;

        if let Some(handle) = state.launch.take() {
            let result = match handle.await {
                Ok(result) => result.map_err(|e| FaultlineError::ScriptExecution {
                    target: slot.target.id.clone(),
                    reason: e.to_string(),
                }),
                Err(e) => Err(FaultlineError::ScriptExecution {
                    target: slot.target.id.clone(),
                    reason: format!("launch task failed: {}", e),
                }),
            };
            if let Err(e) = result {
                state.phase = TargetPhase::Failed;
                return Err(e);
            }
        }

        if let Some(action) = self.profile.restore {
            if let Err(e) = self.adapter.mutate(&slot.target, action).await {
                state.phase = TargetPhase::Failed;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Wait until the target is back in its healthy state.
    pub async fn await_recovered(&self, slot: &TargetSlot) -> Result<()> {
        let mut state = slot.state.lock().await;
        if state.phase == TargetPhase::Reverted {
            return Ok(());
        }

        if let Some(expected) = &self.profile.healthy_state {
            if let Err(e) = self.await_state(&slot.target, expected).await {
                state.phase = TargetPhase::Failed;
                return Err(e);
            }
        }

        state.phase = TargetPhase::Reverted;
        self.events
            .notify(ChaosEvent::TargetReverted {
                target: slot.target.id.clone(),
                kind: slot.target.kind.to_string(),
            })
            .await;
        Ok(())
    }

    /// Inject and wait for convergence in one step (serial mode, abort path).
    pub async fn inject(&self, slot: &TargetSlot) -> Result<()> {
        self.inject_fault(slot).await?;
        self.await_injected(slot).await
    }

    /// Revert and wait for recovery in one step. A no-op once the target
    /// reached `Reverted`.
    pub async fn revert(&self, slot: &TargetSlot) -> Result<()> {
        self.revert_fault(slot).await?;
        self.await_recovered(slot).await
    }

    async fn await_state(&self, target: &Target, expected: &ResourceState) -> Result<()> {
        self.poller
            .poll(|| {
                let adapter = Arc::clone(&self.adapter);
                let target = target.clone();
                let expected = expected.clone();
                async move {
                    let current = adapter.query(&target).await?;
                    if current == expected {
                        Ok(())
                    } else {
                        Err(FaultlineError::Convergence {
                            target: target.id.clone(),
                            expected: expected.to_string(),
                            reason: format!("current state is {}", current),
                        })
                    }
                }
            })
            .await
    }
}
