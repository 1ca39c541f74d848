//!
//! This module implements the CLI interface for ecs-report: argument parsing
//! and the async entrypoint that wires the HTTP client into the core pipeline.
//!
//! All collection and spreadsheet logic lives in the [`ecs-report-core`] crate.
//! This module is strictly for CLI glue.
//!
//! ## How To Use
//! - For command-line users: run the `ecs-report` binary with `--help`.
//! - For programmatic/integration use: build a config with
//!   [`crate::load_config::load_config`] and call [`run`].
//!
//! [`ecs-report-core`]: ../../ecs-report-core/

use crate::client::EcsClient;
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use ecs_report_core::config::ReportConfig;
use ecs_report_core::error::ReportError;
use ecs_report_core::report::{run_report, snapshot_label, ReportSummary};
use std::path::PathBuf;

/// Append a dated ECS capacity snapshot to an Excel report.
#[derive(Parser, Debug)]
#[clap(
    name = "ecs-report",
    version,
    about = "Poll ECS capacity or bucket usage and append a dated snapshot to an Excel sheet"
)]
pub struct Cli {
    /// Hostname or IP address, optionally with port (e.g. ecs.local:4443)
    #[clap(short = 'H', long)]
    pub hostname: String,

    /// Management API user
    #[clap(short, long)]
    pub username: String,

    /// Management API password
    #[clap(short, long, env = "ECS_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Excel sheet filename; created if it does not exist
    #[clap(short, long)]
    pub filename: PathBuf,

    /// Verbose (debug) logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Report per-bucket usage instead of the cluster capacity summary
    #[clap(short, long)]
    pub bucket: bool,

    /// Optional YAML tuning file (caps, billing size unit, scheme, log file)
    #[clap(short, long)]
    pub config: Option<PathBuf>,
}

/// Async entrypoint for main() and integration tests. One full report run.
pub async fn run(config: &ReportConfig) -> Result<ReportSummary> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");
    config.trace_loaded();

    let client = EcsClient::new(&config.connection).map_err(ReportError::Client)?;
    let timestamp = snapshot_label(&Local::now());
    tracing::info!(timestamp = %timestamp, "Snapshot label");

    match run_report(&client, config, &timestamp).await {
        Ok(summary) => {
            tracing::info!(?summary, filename = %config.filename.display(), "Report complete");
            Ok(summary)
        }
        Err(e) => {
            tracing::error!(error = %e, "Report failed");
            Err(e.into())
        }
    }
}
