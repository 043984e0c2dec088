use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use faultline::abort::{AbortSignal, SignalHandler};
use faultline::adapter::MemoryAdapter;
use faultline::cli::Cli;
use faultline::config::RunConfig;
use faultline::observability::init_tracing;
use faultline::probes::NoopProbes;
use faultline::types::{ResourceState, RunOutcome};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // exit codes: 0 completed, 2 aborted with cleanup, 1 failed
    let code = match run_experiment(cli).await {
        Ok(RunOutcome::Completed) => 0,
        Ok(RunOutcome::Aborted) => 2,
        Err(e) => {
            error!(error = %e, "experiment failed");
            1
        }
    };
    std::process::exit(code);
}

async fn run_experiment(cli: Cli) -> anyhow::Result<RunOutcome> {
    let mut config = RunConfig::from_env().context("loading configuration")?;
    config.experiment_name = cli.experiment.clone();
    info!(experiment = %config.experiment_name, "configuration loaded");

    let abort = AbortSignal::new();
    SignalHandler::new(abort.clone()).spawn();

    // The binary ships with the in-memory adapter as a dry-run harness;
    // deployments embed the library with their own ResourceAdapter.
    let adapter = MemoryAdapter::new(healthy_state(&config.experiment_name));

    let outcome = faultline::run(config, adapter, Arc::new(NoopProbes), abort)
        .await
        .context("running experiment")?;
    Ok(outcome)
}

fn healthy_state(experiment: &str) -> ResourceState {
    match experiment {
        "disk-loss" => ResourceState::from("attached"),
        "service-kill" => ResourceState::from("active"),
        "process-kill" => ResourceState::from("alive"),
        _ => ResourceState::from("idle"),
    }
}
