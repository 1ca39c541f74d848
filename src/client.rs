#![doc = "HTTP implementation of the ECS management API used by the report."]
//
//! # ECS client
//!
//! [`EcsClient`] implements [`EcsApi`] from `ecs-report-core` against the ECS
//! management REST API.
//!
//! - Login is `GET /login` with basic auth; the session token comes back in the
//!   `X-SDS-AUTH-TOKEN` response header and is sent on every later request.
//! - Certificate verification is disabled: management endpoints on these
//!   clusters serve self-signed certificates.
//! - No retries; transport default timeouts.
//!
//! Response bodies are decoded into private wire types here and converted to
//! the core's domain types, so the core crate never sees JSON.

use async_trait::async_trait;
use ecs_report_core::config::Connection;
use ecs_report_core::contract::{ApiError, AuthToken, BucketBilling, DashboardSummary, EcsApi};
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const AUTH_TOKEN_HEADER: &str = "X-SDS-AUTH-TOKEN";

pub struct EcsClient {
    http: reqwest::Client,
    base_url: String,
}

impl EcsClient {
    pub fn new(connection: &Connection) -> Result<Self, ApiError> {
        let base_url = connection.base_url();
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = ?e, "Failed to build HTTP client");
                ApiError::Transport {
                    url: base_url.clone(),
                    message: e.to_string(),
                }
            })?;
        tracing::info!(base_url = %base_url, "Initialized EcsClient");
        Ok(EcsClient { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AuthToken,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "GET");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .header(AUTH_TOKEN_HEADER, token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::error!(status = %status, url = %url, "ECS API returned error");
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(|e| transport_error(&url, e))?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ApiError {
    ApiError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl EcsApi for EcsClient {
    async fn authenticate(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let url = self.url("/login");
        tracing::info!(url = %url, username, "Requesting auth token");
        let resp = self
            .http
            .get(&url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::error!(status = %status, url = %url, "Login rejected");
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let token = resp
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or(ApiError::MissingToken)?;
        tracing::debug!("Auth token received");
        Ok(AuthToken::new(token))
    }

    async fn get_namespaces(&self, token: &AuthToken) -> Result<Vec<String>, ApiError> {
        let list: NamespaceList = self
            .get_json(token, self.url("/object/namespaces"), &[])
            .await?;
        tracing::info!(count = list.namespace.len(), "Fetched namespaces");
        Ok(list.namespace.into_iter().map(|n| n.name).collect())
    }

    async fn get_buckets(
        &self,
        token: &AuthToken,
        namespace: &str,
    ) -> Result<Vec<String>, ApiError> {
        let list: BucketList = self
            .get_json(token, self.url("/object/bucket"), &[("namespace", namespace)])
            .await?;
        tracing::info!(namespace, count = list.object_bucket.len(), "Fetched buckets");
        Ok(list.object_bucket.into_iter().map(|b| b.name).collect())
    }

    async fn get_bucket_billing(
        &self,
        token: &AuthToken,
        namespace: &str,
        bucket: &str,
    ) -> Result<BucketBilling, ApiError> {
        let url = self.url(&billing_path(namespace, bucket));
        let info: BillingInfo = self.get_json(token, url.clone(), &[]).await?;
        info.into_billing().map_err(|message| ApiError::Decode { url, message })
    }

    async fn get_dashboard_summary(&self, token: &AuthToken) -> Result<DashboardSummary, ApiError> {
        let url = self.url("/dashboard/zones/localzone");
        let zone: LocalZone = self.get_json(token, url.clone(), &[]).await?;
        zone.into_summary().map_err(|message| ApiError::Decode { url, message })
    }
}

fn billing_path(namespace: &str, bucket: &str) -> String {
    format!("/object/billing/buckets/{namespace}/{bucket}/info")
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
struct NamespaceList {
    namespace: Vec<Named>,
}

#[derive(Deserialize)]
struct BucketList {
    object_bucket: Vec<Named>,
}

/// ECS reports some figures as JSON numbers and some as decimal strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self, field: &str) -> Result<f64, String> {
        match self {
            Numeric::Number(n) => Ok(*n),
            Numeric::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("{field} is not numeric: {s:?}")),
        }
    }
}

#[derive(Deserialize)]
struct BillingInfo {
    total_objects: Numeric,
    total_size: Numeric,
}

impl BillingInfo {
    fn into_billing(self) -> Result<BucketBilling, String> {
        let total_objects = self.total_objects.value("total_objects")?;
        let total_size = self.total_size.value("total_size")?;
        if total_objects < 0.0 || total_size < 0.0 {
            return Err("negative usage figure".to_string());
        }
        Ok(BucketBilling {
            total_objects: total_objects as u64,
            total_size,
        })
    }
}

#[derive(Deserialize)]
struct SpaceSample {
    #[serde(rename = "Space")]
    space: Numeric,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalZone {
    name: String,
    disk_space_total_current: Vec<SpaceSample>,
    disk_space_free_current: Vec<SpaceSample>,
    disk_space_allocated_current: Vec<SpaceSample>,
    disk_space_reserved_current: Vec<SpaceSample>,
}

impl LocalZone {
    fn into_summary(self) -> Result<DashboardSummary, String> {
        fn current(samples: &[SpaceSample], field: &str) -> Result<f64, String> {
            samples
                .first()
                .ok_or_else(|| format!("{field} is empty"))?
                .space
                .value(field)
        }
        Ok(DashboardSummary {
            total: current(&self.disk_space_total_current, "diskSpaceTotalCurrent")?,
            free: current(&self.disk_space_free_current, "diskSpaceFreeCurrent")?,
            allocated: current(&self.disk_space_allocated_current, "diskSpaceAllocatedCurrent")?,
            reserved: current(&self.disk_space_reserved_current, "diskSpaceReservedCurrent")?,
            name: self.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_scheme_and_host() {
        let mut conn = Connection::new("ecs.example.com:4443", "u", "p");
        let client = EcsClient::new(&conn).unwrap();
        assert_eq!(client.url("/login"), "https://ecs.example.com:4443/login");

        conn.scheme = "http".to_string();
        let client = EcsClient::new(&conn).unwrap();
        assert_eq!(
            client.url(&billing_path("ns1", "b1")),
            "http://ecs.example.com:4443/object/billing/buckets/ns1/b1/info"
        );
    }

    #[test]
    fn decodes_listings() {
        let ns: NamespaceList =
            serde_json::from_str(r#"{"namespace":[{"name":"ns1","id":"ns1"},{"name":"ns2"}]}"#)
                .unwrap();
        let names: Vec<_> = ns.namespace.into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["ns1", "ns2"]);

        let buckets: BucketList =
            serde_json::from_str(r#"{"object_bucket":[{"name":"b1","namespace":"ns1"}]}"#).unwrap();
        assert_eq!(buckets.object_bucket[0].name, "b1");

        assert!(serde_json::from_str::<BucketList>(r#"{"bucket":[]}"#).is_err());
    }

    #[test]
    fn decodes_billing_numbers_and_strings() {
        let info: BillingInfo =
            serde_json::from_str(r#"{"total_objects":12,"total_size":"1.5000","total_size_unit":"GB"}"#)
                .unwrap();
        let billing = info.into_billing().unwrap();
        assert_eq!(billing.total_objects, 12);
        assert_eq!(billing.total_size, 1.5);

        let info: BillingInfo =
            serde_json::from_str(r#"{"total_objects":"3","total_size":5000000000}"#).unwrap();
        assert_eq!(info.into_billing().unwrap().total_size, 5e9);

        let info: BillingInfo =
            serde_json::from_str(r#"{"total_objects":1,"total_size":"n/a"}"#).unwrap();
        assert!(info.into_billing().is_err());
    }

    #[test]
    fn decodes_dashboard_space_samples() {
        let body = r#"{
            "name": "vdc1",
            "diskSpaceTotalCurrent": [{"Space": 2147483648, "t": "1"}],
            "diskSpaceFreeCurrent": [{"Space": 1073741824}],
            "diskSpaceAllocatedCurrent": [{"Space": "1073741824"}],
            "diskSpaceReservedCurrent": [{"Space": 0}]
        }"#;
        let zone: LocalZone = serde_json::from_str(body).unwrap();
        let summary = zone.into_summary().unwrap();
        assert_eq!(summary.name, "vdc1");
        assert_eq!(summary.total, 2147483648.0);
        assert_eq!(summary.free, 1073741824.0);
        assert_eq!(summary.allocated, 1073741824.0);
        assert_eq!(summary.reserved, 0.0);
    }

    #[test]
    fn empty_dashboard_sample_is_a_decode_error() {
        let body = r#"{
            "name": "vdc1",
            "diskSpaceTotalCurrent": [],
            "diskSpaceFreeCurrent": [{"Space": 1}],
            "diskSpaceAllocatedCurrent": [{"Space": 1}],
            "diskSpaceReservedCurrent": [{"Space": 1}]
        }"#;
        let zone: LocalZone = serde_json::from_str(body).unwrap();
        let err = zone.into_summary().unwrap_err();
        assert!(err.contains("diskSpaceTotalCurrent"));
    }
}
