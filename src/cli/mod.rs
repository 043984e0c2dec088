//! Command-line interface.
//!
//! Every flag falls back to an environment variable so the binary works both
//! interactively and as a job container where only the environment is
//! controllable.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "faultline",
    version,
    about = "Sequenced fault injection for virtual-infrastructure resources"
)]
pub struct Cli {
    /// Experiment to run: disk-loss, service-kill, process-kill, run-script.
    #[arg(long = "name", env = "EXPERIMENT_NAME")]
    pub experiment: String,

    /// Log level when RUST_LOG is not set.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON.
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub json_logs: bool,
}
