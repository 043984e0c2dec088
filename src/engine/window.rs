//! Chaos window timing.

use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::info;

/// Wall-clock window for one chaos run.
///
/// The loop re-checks expiry only between rounds, so a round started just
/// before the boundary runs to completion; overshoot is accepted by design
/// of the duration contract.
#[derive(Debug)]
pub struct ChaosWindow {
    started: Instant,
    duration: Duration,
}

impl ChaosWindow {
    pub fn start(duration: Duration) -> Self {
        Self {
            started: Instant::now(),
            duration,
        }
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.duration
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// One-shot pause before and after the chaos window.
pub async fn ramp_pause(ramp: Duration, label: &str) {
    if ramp.is_zero() {
        return;
    }
    info!(seconds = ramp.as_secs(), "waiting for ramp time {}", label);
    sleep(ramp).await;
}
