//! Health-probe boundary.
//!
//! The engine invokes the probe runner exactly once per round, during the
//! chaos-active window; a probe failure is fatal for the round and is passed
//! through unchanged.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Phase in which probes are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbePhase {
    /// While the fault is held.
    DuringChaos,
}

impl fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbePhase::DuringChaos => write!(f, "DuringChaos"),
        }
    }
}

/// External probe runner contract.
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    /// Run all configured probes for the given phase.
    async fn run_probes(&self, phase: ProbePhase) -> Result<()>;

    /// Whether any probes are configured. The engine skips the call site
    /// entirely when this returns false.
    fn has_probes(&self) -> bool;
}

/// Probe runner with no probes configured.
pub struct NoopProbes;

#[async_trait]
impl ProbeRunner for NoopProbes {
    async fn run_probes(&self, _phase: ProbePhase) -> Result<()> {
        Ok(())
    }

    fn has_probes(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_probes_report_absent() {
        let probes = NoopProbes;
        assert!(!probes.has_probes());
        assert!(probes.run_probes(ProbePhase::DuringChaos).await.is_ok());
    }

    #[test]
    fn phase_renders_wire_name() {
        assert_eq!(ProbePhase::DuringChaos.to_string(), "DuringChaos");
    }
}
