//! Error types for a report run.

use std::path::PathBuf;

use crate::contract::ApiError;

/// Exit status for any fatal run error.
pub const EXIT_FAILURE: i32 = 1;

/// Errors that can occur while reading or writing the spreadsheet file.
#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    /// The existing file could not be opened or parsed.
    #[error("failed to read workbook {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    /// The file holds no worksheet at all.
    #[error("workbook {0} contains no worksheet")]
    NoWorksheet(PathBuf),

    /// A cell address does not fit in an xlsx sheet.
    #[error("cell ({row}, {column}) is outside the xlsx sheet limits")]
    OutOfRange { row: u32, column: u32 },

    /// Serialising or writing the file failed.
    #[error("failed to write workbook {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

/// Fatal errors of a report run. Per-bucket billing failures never show up here.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Not able to set up the HTTP client: {0}")]
    Client(#[source] ApiError),

    #[error("Not able to get token: {0}")]
    Auth(#[source] ApiError),

    #[error("Not able to get bucket data: {0}")]
    Listing(#[source] ApiError),

    #[error("Not able to get dashboard data: {0}")]
    Dashboard(#[source] ApiError),

    #[error("Error while generating result output: {0}")]
    Workbook(#[from] WorkbookError),
}

impl ReportError {
    /// Process exit status for this kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::Client(_)
            | ReportError::Auth(_)
            | ReportError::Listing(_)
            | ReportError::Dashboard(_)
            | ReportError::Workbook(_) => EXIT_FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_setup_failure_is_not_reported_as_a_token_error() {
        let err = ReportError::Client(ApiError::Transport {
            url: "https://ecs.local".to_string(),
            message: "no TLS backend".to_string(),
        });
        let text = err.to_string();
        assert!(text.starts_with("Not able to set up the HTTP client"), "{text}");
        assert!(!text.contains("token"));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn every_run_failure_exits_one() {
        let errors = [
            ReportError::Auth(ApiError::MissingToken),
            ReportError::Listing(ApiError::Status {
                url: "u".to_string(),
                status: 500,
            }),
            ReportError::Dashboard(ApiError::MissingToken),
            ReportError::Workbook(WorkbookError::NoWorksheet("r.xlsx".into())),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1, "{err}");
        }
    }
}
