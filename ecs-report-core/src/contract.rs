//! # contract: the management API surface the report needs
//!
//! This module defines the [`EcsApi`] trait and the plain data types that flow
//! across it. The real HTTP implementation lives in the CLI crate; tests use
//! the generated [`MockEcsApi`].
//!
//! ## Interface
//! - Every call after [`EcsApi::authenticate`] takes the [`AuthToken`] it returned.
//! - All methods are async and return a typed [`ApiError`].
//! - Implementations do not retry. Callers decide which failures are fatal.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; the mock is exported behind the
//!   `test-export-mocks` feature so dependent crates can use it in their tests.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;

/// Session token returned by the login endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Raw per-bucket usage as reported by the billing endpoint.
///
/// `total_size` is in whatever unit the API version reports; see
/// [`crate::config::SizeUnit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketBilling {
    pub total_objects: u64,
    pub total_size: f64,
}

/// Raw dashboard fields for the local zone. All sizes are bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub name: String,
    pub total: f64,
    pub free: f64,
    pub allocated: f64,
    pub reserved: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("login response carried no X-SDS-AUTH-TOKEN header")]
    MissingToken,
    #[error("unexpected response body from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Read-only access to the ECS management API.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait EcsApi: Send + Sync {
    /// Exchange credentials for a session token.
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthToken, ApiError>;

    /// Names of all namespaces, in the order the API returns them.
    async fn get_namespaces(&self, token: &AuthToken) -> Result<Vec<String>, ApiError>;

    /// Names of the buckets in `namespace`, in API order.
    async fn get_buckets(
        &self,
        token: &AuthToken,
        namespace: &str,
    ) -> Result<Vec<String>, ApiError>;

    /// Object count and size of a single bucket.
    async fn get_bucket_billing(
        &self,
        token: &AuthToken,
        namespace: &str,
        bucket: &str,
    ) -> Result<BucketBilling, ApiError>;

    /// Disk capacity of the local zone.
    async fn get_dashboard_summary(&self, token: &AuthToken) -> Result<DashboardSummary, ApiError>;
}
