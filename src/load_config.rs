use crate::cli::Cli;
use anyhow::{Context, Result};
use ecs_report_core::config::{
    CollectLimits, Connection, ReportConfig, ReportMode, SizeUnit, DEFAULT_LOG_FILE,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Optional YAML tuning file. Connection details never live here; they come
/// from the command line (or `ECS_PASSWORD`).
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuningFile {
    #[serde(default)]
    pub max_namespaces: Option<usize>,
    #[serde(default)]
    pub max_buckets: Option<usize>,
    #[serde(default)]
    pub billing_size_unit: Option<SizeUnit>,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// Reads and parses a tuning file.
pub fn load_tuning<P: AsRef<Path>>(path: P) -> Result<TuningFile> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading tuning file");

    let content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read tuning file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    let tuning: TuningFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config YAML {:?}", path_ref))?;
    info!(config_path = ?path_ref, ?tuning, "Parsed tuning file");
    Ok(tuning)
}

/// Merges command-line arguments with the optional tuning file into one [`ReportConfig`].
pub fn load_config(cli: &Cli) -> Result<ReportConfig> {
    let tuning = match &cli.config {
        Some(path) => load_tuning(path)?,
        None => TuningFile::default(),
    };

    let defaults = CollectLimits::default();
    let limits = CollectLimits {
        max_namespaces: tuning.max_namespaces.unwrap_or(defaults.max_namespaces),
        max_buckets: tuning.max_buckets.unwrap_or(defaults.max_buckets),
    };
    if limits.max_namespaces == 0 || limits.max_buckets == 0 {
        error!(?limits, "Collection caps must be at least 1");
        anyhow::bail!(
            "max_namespaces and max_buckets must be at least 1 (got {} and {})",
            limits.max_namespaces,
            limits.max_buckets
        );
    }

    let mut connection = Connection::new(&cli.hostname, &cli.username, &cli.password);
    if let Some(scheme) = tuning.scheme {
        match scheme.as_str() {
            "http" | "https" => connection.scheme = scheme,
            other => {
                error!(scheme = %other, "Unsupported scheme in config");
                anyhow::bail!("Unsupported scheme: {}", other);
            }
        }
    }

    let mode = if cli.bucket {
        ReportMode::Buckets
    } else {
        ReportMode::Capacity
    };

    let config = ReportConfig {
        connection,
        filename: cli.filename.clone(),
        mode,
        limits,
        size_unit: tuning.billing_size_unit.unwrap_or_default(),
        log_file: tuning
            .log_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    };
    Ok(config)
}
