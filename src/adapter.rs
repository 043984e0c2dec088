//! The resource adapter boundary.
//!
//! The engine drives resources only through this narrow capability contract:
//! one mutating call, one state query, and a pre-injection context capture.
//! Concrete bindings (vCenter management API, guest command execution) live
//! outside the engine; [`MemoryAdapter`] is the in-crate implementation used
//! for tests and dry runs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{FaultlineError, Result};
use crate::types::{ResourceState, Target};

/// Operations the engine may request from an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAction {
    /// Detach a disk from its VM.
    Detach,
    /// Attach a disk back, using the captured backing path.
    Attach,
    /// Stop a guest service.
    Stop,
    /// Start a guest service.
    Start,
    /// Kill a guest process.
    Kill,
    /// Upload a script into the guest.
    Upload,
    /// Execute an uploaded script (blocking remote call).
    Execute,
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceAction::Detach => "detach",
            ResourceAction::Attach => "attach",
            ResourceAction::Stop => "stop",
            ResourceAction::Start => "start",
            ResourceAction::Kill => "kill",
            ResourceAction::Upload => "upload",
            ResourceAction::Execute => "execute",
        };
        write!(f, "{}", s)
    }
}

/// Per-resource-kind capability the engine consumes.
///
/// Implementations issue remote management-API calls or guest-command
/// executions; the engine never knows which. Calls are not assumed
/// idempotent — the engine serializes them per target.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Apply a fault or restore action to the target.
    async fn mutate(&self, target: &Target, action: ResourceAction) -> Result<()>;

    /// Query the target's current state.
    async fn query(&self, target: &Target) -> Result<ResourceState>;

    /// Capture resource-specific data required to revert, before any
    /// mutation (e.g. the disk's VMDK backing path). Default: nothing.
    async fn capture_revert_context(&self, _target: &Target) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

// ============================================================================
// In-memory adapter
// ============================================================================

/// Scripted in-memory adapter.
///
/// Tracks a state string per target id, applies a configured transition per
/// action, and records every call in order. Queries can be made to lag
/// mutations by a fixed number of calls to exercise convergence polling.
pub struct MemoryAdapter {
    inner: Mutex<MemoryAdapterState>,
}

struct MemoryAdapterState {
    default_state: ResourceState,
    states: HashMap<String, ResourceState>,
    /// action → resulting state
    transitions: HashMap<ResourceAction, ResourceState>,
    /// queries remaining before a mutation becomes visible, per target
    lag: HashMap<String, u32>,
    /// configured query lag applied after each mutation
    query_lag: u32,
    /// pending state applied once the lag drains, per target
    pending: HashMap<String, ResourceState>,
    /// targets whose next mutate call fails
    failing: HashMap<String, String>,
    log: Vec<String>,
    revert_context: HashMap<String, String>,
}

impl MemoryAdapter {
    pub fn new(initial_state: ResourceState) -> Arc<Self> {
        let mut transitions = HashMap::new();
        transitions.insert(ResourceAction::Detach, ResourceState::from("detached"));
        transitions.insert(ResourceAction::Attach, ResourceState::from("attached"));
        transitions.insert(ResourceAction::Stop, ResourceState::from("inactive"));
        transitions.insert(ResourceAction::Start, ResourceState::from("active"));
        transitions.insert(ResourceAction::Kill, ResourceState::from("dead"));

        Arc::new(Self {
            inner: Mutex::new(MemoryAdapterState {
                default_state: initial_state,
                states: HashMap::new(),
                transitions,
                lag: HashMap::new(),
                query_lag: 0,
                pending: HashMap::new(),
                failing: HashMap::new(),
                log: Vec::new(),
                revert_context: HashMap::new(),
            }),
        })
    }

    /// Seed the reported state for one target.
    pub async fn set_state(&self, id: &str, state: ResourceState) {
        self.inner.lock().await.states.insert(id.to_string(), state);
    }

    /// Make queries lag each mutation by `n` calls.
    pub async fn set_query_lag(&self, n: u32) {
        self.inner.lock().await.query_lag = n;
    }

    /// Make the next mutate call against `id` fail with `reason`.
    pub async fn fail_next_mutate(&self, id: &str, reason: &str) {
        self.inner
            .lock()
            .await
            .failing
            .insert(id.to_string(), reason.to_string());
    }

    /// Provide revert-context entries returned by `capture_revert_context`.
    pub async fn set_revert_context(&self, key: &str, value: &str) {
        self.inner
            .lock()
            .await
            .revert_context
            .insert(key.to_string(), value.to_string());
    }

    /// Ordered log of calls, as `"<op> <id>"` strings.
    pub async fn call_log(&self) -> Vec<String> {
        self.inner.lock().await.log.clone()
    }
}

#[async_trait]
impl ResourceAdapter for MemoryAdapter {
    async fn mutate(&self, target: &Target, action: ResourceAction) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.log.push(format!("{} {}", action, target.id));

        if let Some(reason) = inner.failing.remove(&target.id) {
            return Err(FaultlineError::Adapter {
                target: target.id.clone(),
                action: action.to_string(),
                reason,
            });
        }

        if let Some(next) = inner.transitions.get(&action).cloned() {
            if inner.query_lag > 0 {
                let lag = inner.query_lag;
                inner.lag.insert(target.id.clone(), lag);
                inner.pending.insert(target.id.clone(), next);
            } else {
                inner.states.insert(target.id.clone(), next);
            }
        }
        Ok(())
    }

    async fn query(&self, target: &Target) -> Result<ResourceState> {
        let mut inner = self.inner.lock().await;
        inner.log.push(format!("query {}", target.id));

        if let Some(remaining) = inner.lag.get_mut(&target.id) {
            if *remaining > 1 {
                *remaining -= 1;
            } else {
                inner.lag.remove(&target.id);
                if let Some(state) = inner.pending.remove(&target.id) {
                    inner.states.insert(target.id.clone(), state);
                }
            }
        }

        Ok(inner
            .states
            .get(&target.id)
            .cloned()
            .unwrap_or_else(|| inner.default_state.clone()))
    }

    async fn capture_revert_context(&self, target: &Target) -> Result<HashMap<String, String>> {
        let mut inner = self.inner.lock().await;
        inner.log.push(format!("capture {}", target.id));
        info!(target = %target.id, "captured revert context");
        Ok(inner.revert_context.clone())
    }
}
