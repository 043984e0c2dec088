//! The chaos engine: window loop and injection strategies.
//!
//! One generic engine drives every fault kind; the per-kind differences live
//! entirely in the [`FaultProfile`](crate::lifecycle::FaultProfile). The
//! engine owns the run loop (ramp, rounds until the window elapses, ramp)
//! and the serial/parallel strategies; per-target mechanics are delegated to
//! [`Lifecycle`].

pub mod window;

use std::sync::Arc;
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use crate::abort::{AbortSignal, AbortWatcher};
use crate::adapter::ResourceAdapter;
use crate::config::RunConfig;
use crate::error::Result;
use crate::events::{ChaosEvent, EventSink};
use crate::lifecycle::{FaultProfile, Lifecycle};
use crate::poller::RetryPoller;
use crate::probes::{ProbePhase, ProbeRunner};
use crate::types::{RunOutcome, Sequence, Target, TargetSlot};

use self::window::{ramp_pause, ChaosWindow};

/// Orchestrates one chaos run over a fixed target list.
pub struct ChaosEngine {
    config: RunConfig,
    lifecycle: Arc<Lifecycle>,
    probes: Arc<dyn ProbeRunner>,
    events: Arc<dyn EventSink>,
    abort: AbortSignal,
    slots: Vec<Arc<TargetSlot>>,
}

impl ChaosEngine {
    pub fn new(
        config: RunConfig,
        profile: FaultProfile,
        adapter: Arc<dyn ResourceAdapter>,
        targets: Vec<Target>,
        probes: Arc<dyn ProbeRunner>,
        events: Arc<dyn EventSink>,
        abort: AbortSignal,
    ) -> Self {
        let poller = RetryPoller::from_budget(config.timeout, config.delay);
        let lifecycle = Arc::new(Lifecycle::new(
            adapter,
            profile,
            poller,
            Arc::clone(&events),
        ));
        let slots = targets.into_iter().map(TargetSlot::new).collect();
        Self {
            config,
            lifecycle,
            probes,
            events,
            abort,
            slots,
        }
    }

    /// Targets in run order.
    pub fn slots(&self) -> &[Arc<TargetSlot>] {
        &self.slots
    }

    /// Run the chaos window to completion or abort.
    pub async fn run(&self) -> Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            experiment = %self.config.experiment_name,
            sequence = %self.config.sequence,
            targets = self.slots.len(),
            "starting chaos run"
        );

        // revert context must exist before the first mutation
        for slot in &self.slots {
            self.lifecycle.capture_context(slot).await?;
        }

        ramp_pause(self.config.ramp_time, "before injecting chaos").await;

        let outcome = if self.lifecycle.profile().watch_abort {
            self.run_with_watcher().await?
        } else {
            self.drive_window().await?;
            if self.abort.is_triggered() {
                RunOutcome::Aborted
            } else {
                RunOutcome::Completed
            }
        };

        if outcome == RunOutcome::Completed {
            ramp_pause(self.config.ramp_time, "after reverting chaos").await;
            info!(run_id = %run_id, "chaos run completed");
        } else {
            warn!(run_id = %run_id, "chaos run aborted");
        }
        Ok(outcome)
    }

    async fn run_with_watcher(&self) -> Result<RunOutcome> {
        let watcher = AbortWatcher::new(
            Arc::clone(&self.lifecycle),
            self.slots.clone(),
            Arc::clone(&self.events),
            self.abort.clone(),
        );
        let mut watcher_handle = tokio::spawn(watcher.run());

        tokio::select! {
            result = self.drive_window() => {
                if self.abort.is_triggered() {
                    // let the sweep finish before reporting; a main-path
                    // error racing the abort must not mask the outcome
                    let _ = watcher_handle.await;
                    if let Err(e) = result {
                        warn!(error = %e, "run error superseded by abort");
                    }
                    Ok(RunOutcome::Aborted)
                } else {
                    watcher_handle.abort();
                    result?;
                    Ok(RunOutcome::Completed)
                }
            }
            _ = &mut watcher_handle => Ok(RunOutcome::Aborted),
        }
    }

    /// Loop rounds until the window elapses or an abort is seen.
    ///
    /// Expiry is checked only between rounds; a round started before the
    /// boundary always runs to completion.
    async fn drive_window(&self) -> Result<()> {
        let window = ChaosWindow::start(self.config.chaos_duration);
        let single_shot = self.config.sequence == Sequence::Parallel
            && self.lifecycle.profile().single_shot_parallel;
        let mut round: u64 = 0;

        while !window.expired() {
            if self.abort.is_triggered() {
                return Ok(());
            }
            round += 1;

            if !self.config.engine_name.is_empty() {
                self.events
                    .notify(ChaosEvent::RoundStarted {
                        experiment: self.config.experiment_name.clone(),
                        round,
                        message: format!(
                            "Injecting {} chaos on target resources",
                            self.config.experiment_name
                        ),
                    })
                    .await;
            }

            match self.config.sequence {
                Sequence::Serial => self.run_serial_round().await?,
                Sequence::Parallel => self.run_parallel_round().await?,
            }

            if single_shot {
                break;
            }
        }

        info!(
            rounds = round,
            elapsed_secs = window.elapsed().as_secs(),
            "chaos window elapsed"
        );
        Ok(())
    }

    /// One target at a time: full inject, hold, revert cycle each.
    async fn run_serial_round(&self) -> Result<()> {
        for (i, slot) in self.slots.iter().enumerate() {
            if self.abort.is_triggered() {
                return Ok(());
            }

            self.lifecycle.inject(slot).await?;

            // probes run once per round, against the first held fault
            if self.probes.has_probes() && i == 0 {
                self.probes.run_probes(ProbePhase::DuringChaos).await?;
            }

            sleep(self.config.chaos_interval).await;
            self.lifecycle.revert(slot).await?;
        }
        Ok(())
    }

    /// Pass-by-pass over the whole list: all faults held simultaneously.
    async fn run_parallel_round(&self) -> Result<()> {
        for slot in &self.slots {
            self.lifecycle.inject_fault(slot).await?;
        }
        for slot in &self.slots {
            self.lifecycle.await_injected(slot).await?;
        }

        if self.probes.has_probes() {
            self.probes.run_probes(ProbePhase::DuringChaos).await?;
        }
        sleep(self.config.chaos_interval).await;

        for slot in &self.slots {
            self.lifecycle.revert_fault(slot).await?;
        }
        for slot in &self.slots {
            self.lifecycle.await_recovered(slot).await?;
        }
        Ok(())
    }
}
