//! Faultline: sequenced fault injection for virtual-infrastructure resources.
//!
//! One generic [`ChaosEngine`](engine::ChaosEngine) drives every fault kind;
//! the per-kind differences (which action injects, which reverts, which
//! resource states confirm each) are data in a
//! [`FaultProfile`](lifecycle::FaultProfile). An experiment pairs a profile
//! with a target list; the engine runs rounds over the targets, serially or
//! in parallel, until the chaos window elapses or an abort is triggered.
//!
//! Resource access goes through the [`ResourceAdapter`](adapter::ResourceAdapter)
//! trait; the crate ships an in-memory adapter for tests and dry runs, and
//! deployments bind their own (vCenter API, guest command execution).
//!
//! ```no_run
//! use std::sync::Arc;
//! use faultline::abort::AbortSignal;
//! use faultline::adapter::MemoryAdapter;
//! use faultline::config::RunConfig;
//! use faultline::probes::NoopProbes;
//! use faultline::types::ResourceState;
//!
//! # async fn demo() -> faultline::error::Result<()> {
//! let mut config = RunConfig::from_env()?;
//! config.experiment_name = "disk-loss".into();
//! let adapter = MemoryAdapter::new(ResourceState::from("attached"));
//! let outcome = faultline::run(config, adapter, Arc::new(NoopProbes), AbortSignal::new()).await?;
//! # Ok(())
//! # }
//! ```

pub mod abort;
pub mod adapter;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod experiments;
pub mod lifecycle;
pub mod observability;
pub mod poller;
pub mod probes;
pub mod types;

use std::sync::Arc;

use abort::AbortSignal;
use adapter::ResourceAdapter;
use config::RunConfig;
use engine::ChaosEngine;
use error::Result;
use events::{EventSink, LogSink};
use probes::ProbeRunner;
use types::RunOutcome;

pub use error::FaultlineError;

/// Resolve the configured experiment and run it to completion or abort.
pub async fn run(
    config: RunConfig,
    adapter: Arc<dyn ResourceAdapter>,
    probes: Arc<dyn ProbeRunner>,
    abort: AbortSignal,
) -> Result<RunOutcome> {
    let experiment = experiments::build(&config.experiment_name, &config)?;
    let events: Arc<dyn EventSink> = Arc::new(LogSink);
    let engine = ChaosEngine::new(
        config,
        experiment.profile,
        adapter,
        experiment.targets,
        probes,
        events,
        abort,
    );
    engine.run().await
}
