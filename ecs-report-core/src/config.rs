use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_MAX_NAMESPACES: usize = 100;
pub const DEFAULT_MAX_BUCKETS: usize = 100;
pub const DEFAULT_LOG_FILE: &str = "ecs-report.log";

/// Everything a single report run needs. Built once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub connection: Connection,
    pub filename: PathBuf,
    pub mode: ReportMode,
    pub limits: CollectLimits,
    pub size_unit: SizeUnit,
    pub log_file: PathBuf,
}

impl ReportConfig {
    pub fn trace_loaded(&self) {
        info!(
            host = %self.connection.host,
            username = %self.connection.username,
            filename = %self.filename.display(),
            mode = ?self.mode,
            "Loaded ReportConfig"
        );
        debug!(?self, "ReportConfig loaded (full debug)");
    }
}

#[derive(Clone)]
pub struct Connection {
    /// `host` or `host:port`.
    pub host: String,
    pub username: String,
    pub password: String,
    pub scheme: String,
}

impl Connection {
    pub fn new(host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            scheme: "https".to_string(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host.trim_end_matches('/'))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"***")
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// One row per (namespace, bucket), one new column per run.
    Buckets,
    /// Cluster-wide capacity, one new row per run.
    Capacity,
}

/// Upper bounds on how much of the namespace/bucket tree one run visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectLimits {
    pub max_namespaces: usize,
    pub max_buckets: usize,
}

impl Default for CollectLimits {
    fn default() -> Self {
        Self {
            max_namespaces: DEFAULT_MAX_NAMESPACES,
            max_buckets: DEFAULT_MAX_BUCKETS,
        }
    }
}

/// Unit of the `total_size` field in bucket billing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    #[default]
    Bytes,
    Gigabytes,
}

impl SizeUnit {
    /// Convert a reported size to bytes.
    pub fn to_bytes(self, size: f64) -> f64 {
        match self {
            SizeUnit::Bytes => size,
            SizeUnit::Gigabytes => size * 1024.0 * 1024.0 * 1024.0,
        }
    }
}
