//! High-level pipeline: authenticate → collect → merge → save.
//!
//! [`run_report`] performs one full report run for the configured
//! [`ReportMode`]. It is strictly sequential and fail-fast: the first fatal
//! error is returned unchanged as a [`ReportError`], and the workbook is only
//! written after a successful merge.
//!
//! # Callable From
//! - The CLI crate, with the real HTTP client
//! - Integration tests, with [`crate::contract::MockEcsApi`]

use chrono::{DateTime, TimeZone};
use tracing::{error, info};

use crate::collect::{collect_buckets, collect_capacity};
use crate::config::{ReportConfig, ReportMode};
use crate::contract::EcsApi;
use crate::error::ReportError;
use crate::sheet::{append_capacity_snapshot, upsert_bucket_snapshot, TIMESTAMP_FORMAT};
use crate::workbook;

/// What a finished run wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSummary {
    Buckets {
        records: usize,
        appended_rows: usize,
        column: u32,
    },
    Capacity {
        row: u32,
    },
}

/// Label used for the snapshot column or row.
pub fn snapshot_label<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format(TIMESTAMP_FORMAT).to_string()
}

pub async fn run_report<A>(
    api: &A,
    config: &ReportConfig,
    timestamp: &str,
) -> Result<ReportSummary, ReportError>
where
    A: EcsApi + ?Sized,
{
    info!(mode = ?config.mode, "[REPORT] Starting report run");

    let token = api
        .authenticate(&config.connection.username, &config.connection.password)
        .await
        .map_err(|e| {
            error!(error = %e, "[REPORT][ERROR] Authentication failed");
            ReportError::Auth(e)
        })?;
    info!("[REPORT] Authenticated");

    match config.mode {
        ReportMode::Buckets => {
            let records =
                collect_buckets(api, &token, &config.limits, config.size_unit).await?;

            info!("[REPORT] Merging bucket snapshot into workbook");
            let mut document = workbook::load(&config.filename)?;
            let outcome = upsert_bucket_snapshot(&mut document.active_mut().grid, &records, timestamp);
            workbook::save(&document, &config.filename)?;

            info!(
                records = records.len(),
                appended_rows = outcome.appended_rows,
                column = outcome.column,
                "[REPORT] Bucket report complete"
            );
            Ok(ReportSummary::Buckets {
                records: records.len(),
                appended_rows: outcome.appended_rows,
                column: outcome.column,
            })
        }
        ReportMode::Capacity => {
            let summary = collect_capacity(api, &token, &config.connection.host).await?;

            info!("[REPORT] Appending capacity snapshot to workbook");
            let mut document = workbook::load(&config.filename)?;
            let row = append_capacity_snapshot(&mut document.active_mut().grid, &summary, timestamp);
            workbook::save(&document, &config.filename)?;

            info!(row, "[REPORT] Capacity report complete");
            Ok(ReportSummary::Capacity { row })
        }
    }
}
