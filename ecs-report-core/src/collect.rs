//! Collection of report records from the management API.
//!
//! - [`collect_buckets`] walks namespaces → buckets → billing info, visiting
//!   at most [`CollectLimits::max_namespaces`] namespaces and
//!   [`CollectLimits::max_buckets`] buckets per namespace, in API order.
//!   Listing failures are fatal; a failed billing call degrades that bucket to
//!   zero values and the walk continues.
//! - [`collect_capacity`] reads the dashboard once. There is no fallback record,
//!   so any failure is fatal.
//!
//! All requests are awaited one after another.

use tracing::{debug, info, warn};

use crate::config::{CollectLimits, SizeUnit};
use crate::contract::{AuthToken, DashboardSummary, EcsApi};
use crate::error::ReportError;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Usage of one bucket at collection time. `total_size` is in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRecord {
    pub namespace: String,
    pub bucket_name: String,
    pub total_objects: u64,
    pub total_size: f64,
}

/// Cluster-wide capacity in gigabytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacitySummary {
    pub vdc_label: String,
    pub total_gb: f64,
    pub free_gb: f64,
    pub allocated_gb: f64,
    pub reserved_gb: f64,
}

impl CapacitySummary {
    /// Convert raw dashboard bytes. Free, allocated and reserved are rounded to
    /// two decimals; total is kept exact.
    pub fn from_dashboard(dashboard: &DashboardSummary, host: &str) -> Self {
        Self {
            vdc_label: format!("{} {}", dashboard.name, strip_port(host)),
            total_gb: bytes_to_gb(dashboard.total),
            free_gb: round2(bytes_to_gb(dashboard.free)),
            allocated_gb: round2(bytes_to_gb(dashboard.allocated)),
            reserved_gb: round2(bytes_to_gb(dashboard.reserved)),
        }
    }
}

pub fn bytes_to_gb(bytes: f64) -> f64 {
    bytes / BYTES_PER_GB
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `host:port` → `host`. Bracketed IPv6 literals keep their brackets.
pub fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.chars().all(|c| c.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    }
}

/// Walk the namespace/bucket tree and return one record per visited bucket.
pub async fn collect_buckets<A>(
    api: &A,
    token: &AuthToken,
    limits: &CollectLimits,
    size_unit: SizeUnit,
) -> Result<Vec<BucketRecord>, ReportError>
where
    A: EcsApi + ?Sized,
{
    let namespaces = api
        .get_namespaces(token)
        .await
        .map_err(ReportError::Listing)?;
    if namespaces.len() > limits.max_namespaces {
        debug!(
            available = namespaces.len(),
            cap = limits.max_namespaces,
            "Namespace cap reached, skipping the rest"
        );
    }

    let mut records = Vec::new();
    for namespace in namespaces.iter().take(limits.max_namespaces) {
        info!(namespace = %namespace, "Namespace");
        let buckets = api
            .get_buckets(token, namespace)
            .await
            .map_err(ReportError::Listing)?;
        if buckets.len() > limits.max_buckets {
            debug!(
                namespace = %namespace,
                available = buckets.len(),
                cap = limits.max_buckets,
                "Bucket cap reached, skipping the rest"
            );
        }

        for bucket in buckets.iter().take(limits.max_buckets) {
            debug!(namespace = %namespace, bucket = %bucket, "Bucket");
            let (total_objects, total_size) =
                match api.get_bucket_billing(token, namespace, bucket).await {
                    Ok(billing) => (billing.total_objects, size_unit.to_bytes(billing.total_size)),
                    Err(e) => {
                        warn!(
                            namespace = %namespace,
                            bucket = %bucket,
                            error = %e,
                            "Billing info unavailable, recording zero usage"
                        );
                        (0, 0.0)
                    }
                };
            records.push(BucketRecord {
                namespace: namespace.clone(),
                bucket_name: bucket.clone(),
                total_objects,
                total_size,
            });
        }
    }

    info!(count = records.len(), "Collected bucket records");
    Ok(records)
}

/// Read the local zone dashboard and label it with `host` (port stripped).
pub async fn collect_capacity<A>(
    api: &A,
    token: &AuthToken,
    host: &str,
) -> Result<CapacitySummary, ReportError>
where
    A: EcsApi + ?Sized,
{
    let dashboard = api
        .get_dashboard_summary(token)
        .await
        .map_err(ReportError::Dashboard)?;
    let summary = CapacitySummary::from_dashboard(&dashboard, host);
    info!(
        vdc = %summary.vdc_label,
        total_gb = summary.total_gb,
        free_gb = summary.free_gb,
        allocated_gb = summary.allocated_gb,
        reserved_gb = summary.reserved_gb,
        "Collected capacity summary"
    );
    Ok(summary)
}
