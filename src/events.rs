//! Event notification for chaos runs.
//!
//! Emission is fire-and-forget: a full or closed channel never fails a
//! round. Subscribers see round starts, per-target phase changes, and the
//! abort path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Events emitted by the chaos engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChaosEvent {
    /// One notification per round start.
    RoundStarted {
        experiment: String,
        round: u64,
        message: String,
    },
    TargetInjected { target: String, kind: String },
    TargetReverted { target: String, kind: String },
    AbortStarted,
    AbortCompleted,
}

/// Timestamped event envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ChaosEvent,
}

/// Consumer-side event boundary. Emission failures are swallowed.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn notify(&self, event: ChaosEvent);
}

/// Broadcast-backed recorder; subscribers receive timestamped records.
pub struct EventRecorder {
    tx: broadcast::Sender<EventRecord>,
}

impl EventRecorder {
    pub fn new() -> Arc<Self> {
        let (tx, _) = broadcast::channel(1000);
        Arc::new(Self { tx })
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventSink for EventRecorder {
    async fn notify(&self, event: ChaosEvent) {
        let record = EventRecord {
            timestamp: Utc::now(),
            event,
        };
        // no receivers is fine
        let _ = self.tx.send(record);
    }
}

/// Sink that only logs; used when no engine/event consumer is configured.
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn notify(&self, event: ChaosEvent) {
        match &event {
            ChaosEvent::RoundStarted {
                experiment,
                round,
                message,
            } => info!(experiment = %experiment, round, "{}", message),
            ChaosEvent::TargetInjected { target, kind } => {
                info!(target = %target, kind = %kind, "target injected")
            }
            ChaosEvent::TargetReverted { target, kind } => {
                info!(target = %target, kind = %kind, "target reverted")
            }
            ChaosEvent::AbortStarted => info!("[Abort]: Chaos Revert Started"),
            ChaosEvent::AbortCompleted => info!("[Abort]: Chaos Revert Completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recorder_delivers_to_subscriber() {
        let recorder = EventRecorder::new();
        let mut rx = recorder.subscribe();

        recorder
            .notify(ChaosEvent::RoundStarted {
                experiment: "disk-loss".into(),
                round: 1,
                message: "Injecting disk-loss chaos on VM".into(),
            })
            .await;

        let record = rx.recv().await.unwrap();
        match record.event {
            ChaosEvent::RoundStarted { round, .. } => assert_eq!(round, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn notify_without_subscribers_is_nonfatal() {
        let recorder = EventRecorder::new();
        // no subscriber attached
        recorder.notify(ChaosEvent::AbortStarted).await;
    }
}
