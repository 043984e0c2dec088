//! Core types shared across the Faultline engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Kind of resource a target addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A virtual disk attached to a VM.
    Disk,
    /// A guest-OS service.
    Service,
    /// A guest-OS process.
    Process,
    /// An arbitrary script executed inside a guest.
    Script,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Disk => write!(f, "Disk"),
            TargetKind::Service => write!(f, "Service"),
            TargetKind::Process => write!(f, "Process"),
            TargetKind::Script => write!(f, "Script"),
        }
    }
}

/// Phase of a target within the current round.
///
/// Transitions only move forward along
/// `Pending → Injecting → Injected → Reverting → Reverted`; `Failed` is
/// reachable from `Injecting` or `Reverting` and is terminal for the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPhase {
    Pending,
    Injecting,
    Injected,
    Reverting,
    Reverted,
    Failed,
}

impl fmt::Display for TargetPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetPhase::Pending => "pending",
            TargetPhase::Injecting => "injecting",
            TargetPhase::Injected => "injected",
            TargetPhase::Reverting => "reverting",
            TargetPhase::Reverted => "reverted",
            TargetPhase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// State of a resource as reported by the adapter.
///
/// The per-kind state vocabulary is small and string-shaped on the wire
/// ("attached"/"detached", "active"/"inactive", "alive"/"dead"), so the
/// engine compares states rather than interpreting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState(pub String);

impl ResourceState {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceState {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One addressable resource instance under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Immutable identity: disk id, service name, process id, or VM name.
    pub id: String,
    /// Resource kind.
    pub kind: TargetKind,
    /// Resource-specific extra data needed to revert (e.g. the disk's
    /// backing-file path, the owning VM id). Captured once before injection.
    pub auxiliary: HashMap<String, String>,
}

impl Target {
    pub fn new(id: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            auxiliary: HashMap::new(),
        }
    }

    /// Attach an auxiliary key/value pair (builder style).
    pub fn with_aux(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auxiliary.insert(key.into(), value.into());
        self
    }
}

/// Mutable per-target state, guarded by the slot lock.
#[derive(Debug)]
pub struct TargetState {
    pub phase: TargetPhase,
    /// Handle of a detached launch task (script execution), awaited on revert.
    pub launch: Option<JoinHandle<Result<()>>>,
}

/// A target plus its lock-guarded mutable state.
///
/// Both the injection strategies and the abort watcher go through the same
/// slot; every adapter mutation takes the lock first, so an abort-triggered
/// revert can never race an in-flight inject or revert on the same target.
#[derive(Debug)]
pub struct TargetSlot {
    pub target: Target,
    pub state: Mutex<TargetState>,
}

impl TargetSlot {
    pub fn new(target: Target) -> Arc<Self> {
        Arc::new(Self {
            target,
            state: Mutex::new(TargetState {
                phase: TargetPhase::Pending,
                launch: None,
            }),
        })
    }

    /// Current phase (snapshot; the phase may change after the lock drops).
    pub async fn phase(&self) -> TargetPhase {
        self.state.lock().await.phase
    }
}

/// Execution ordering for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sequence {
    /// One target at a time, full inject→revert cycle each.
    Serial,
    /// Pass-by-pass over the whole target list, faults held simultaneously.
    Parallel,
}

impl Sequence {
    /// Parse the configuration value, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Some(Sequence::Serial),
            "parallel" => Some(Sequence::Parallel),
            _ => None,
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sequence::Serial => write!(f, "serial"),
            Sequence::Parallel => write!(f, "parallel"),
        }
    }
}

/// How an engine run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The chaos window elapsed and every round completed.
    Completed,
    /// External cancellation arrived; all targets were best-effort reverted.
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_parses_case_insensitively() {
        assert_eq!(Sequence::parse("Serial"), Some(Sequence::Serial));
        assert_eq!(Sequence::parse("PARALLEL"), Some(Sequence::Parallel));
        assert_eq!(Sequence::parse("diagonal"), None);
    }

    #[test]
    fn target_builder_accumulates_auxiliary() {
        let t = Target::new("disk-1", TargetKind::Disk)
            .with_aux("vm_id", "vm-42")
            .with_aux("backing_path", "[datastore] disk-1.vmdk");
        assert_eq!(t.auxiliary.len(), 2);
        assert_eq!(t.auxiliary["vm_id"], "vm-42");
    }

    #[tokio::test]
    async fn slot_starts_pending() {
        let slot = TargetSlot::new(Target::new("svc-a", TargetKind::Service));
        assert_eq!(slot.phase().await, TargetPhase::Pending);
    }

    #[test]
    fn resource_state_compares_by_value() {
        assert_eq!(ResourceState::from("attached"), ResourceState::new("attached"));
        assert_ne!(ResourceState::from("attached"), ResourceState::from("detached"));
    }
}
