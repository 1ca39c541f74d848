use chrono::Local;
use clap::Parser;
use ecs_report::cli::{run, Cli};
use ecs_report::load_config::load_config;
use ecs_report::logging::init_logging;
use ecs_report_core::config::DEFAULT_LOG_FILE;
use ecs_report_core::error::{ReportError, EXIT_FAILURE};
use ecs_report_core::report::snapshot_label;
use std::path::Path;

#[tokio::main]
async fn main() {
    // Load environment (ECS_PASSWORD may live in .env)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match load_config(&cli) {
        Ok(config) => match init_logging(&config.log_file, cli.verbose) {
            Ok(()) => {
                tracing::info!("Started");
                run(&config).await.map(|summary| (config, summary))
            }
            Err(e) => {
                fallback_logging(cli.verbose);
                Err(e)
            }
        },
        Err(e) => {
            fallback_logging(cli.verbose);
            Err(e)
        }
    };

    match result {
        Ok((config, summary)) => {
            tracing::info!(?summary, "Finished");
            println!("Report written to {}", config.filename.display());
            std::process::exit(0);
        }
        Err(e) => {
            let code = e
                .downcast_ref::<ReportError>()
                .map(ReportError::exit_code)
                .unwrap_or(EXIT_FAILURE);
            tracing::error!(error = %e, code, "Exiting with error");
            println!("{}: {}", snapshot_label(&Local::now()), e);
            std::process::exit(code);
        }
    }
}

/// Log to the default file when the configured one could not be set up, so
/// startup failures still reach a log.
fn fallback_logging(verbose: bool) {
    if let Err(e) = init_logging(Path::new(DEFAULT_LOG_FILE), verbose) {
        eprintln!("Logging disabled: {e:#}");
    }
}
