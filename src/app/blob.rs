//! Blob delivery for generated usage data (Pipeline A)
//!
//! Starts a server-side copy of the signed download URL into the destination
//! container and polls the blob's copy status until it leaves `pending`.
//! An absent copy status means the copy has not registered yet and simply
//! needs another (shorter) wait, not an error.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::auth::AzureCliCredential;
use crate::config::PollingConfig;
use crate::constants::{arm, delivery};
use crate::errors::{ApiError, ApiResult, DeliveryError, DeliveryResult};

/// Blob service endpoint for a storage account name
pub fn blob_endpoint(storage_account: &str) -> String {
    format!("https://{storage_account}.blob.core.windows.net")
}

/// Snapshot of a blob's copy state, read from response headers
#[derive(Debug, Clone, Default)]
pub struct CopyState {
    /// `x-ms-copy-status`: absent until the copy registers
    pub status: Option<String>,
    /// `x-ms-copy-progress`: bytes copied / bytes total
    pub progress: Option<String>,
    /// `x-ms-copy-status-description`: failure detail, when present
    pub description: Option<String>,
}

impl CopyState {
    fn from_response(response: &Response) -> Self {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            status: header("x-ms-copy-status"),
            progress: header("x-ms-copy-progress"),
            description: header("x-ms-copy-status-description"),
        }
    }
}

/// What the poll loop should do next for an observed copy status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStep {
    /// Status not yet available; short wait and poll again
    Wait,
    /// Copy is pending; longer wait and poll again
    InProgress,
    /// Any other status is terminal; stop polling immediately
    Terminal,
}

/// Classify an observed copy status
pub fn classify(status: Option<&str>) -> CopyStep {
    match status {
        None => CopyStep::Wait,
        Some(s) if s.eq_ignore_ascii_case("pending") => CopyStep::InProgress,
        Some(_) => CopyStep::Terminal,
    }
}

/// Storage data-plane client for server-side copies
///
/// Carries its own credential provider because storage access may run
/// against a different subscription than the management-plane calls.
#[derive(Debug, Clone)]
pub struct BlobClient {
    http: Client,
    credential: Arc<AzureCliCredential>,
}

impl BlobClient {
    pub fn new(http: Client, credential: Arc<AzureCliCredential>) -> Self {
        Self { http, credential }
    }

    /// Absolute URL of a blob inside the destination account
    pub fn blob_url(&self, storage_account: &str, container: &str, path: &str) -> ApiResult<Url> {
        let raw = format!("{}/{}/{}", blob_endpoint(storage_account), container, path);
        Url::parse(&raw).map_err(|_| ApiError::InvalidUrl { url: raw })
    }

    async fn request(&self, method: Method, url: Url) -> ApiResult<reqwest::RequestBuilder> {
        let token = self
            .credential
            .get_token(arm::STORAGE_RESOURCE)
            .await
            .map_err(|e| ApiError::OperationFailed {
                status: format!("token acquisition failed: {e}"),
            })?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(&token.token)
            .header("x-ms-version", delivery::BLOB_SERVICE_VERSION))
    }

    /// Start a server-side copy of `source_url` into `blob_url`
    pub async fn start_copy_from_url(&self, blob_url: Url, source_url: &str) -> ApiResult<()> {
        let response = self
            .request(Method::PUT, blob_url)
            .await?
            .header("x-ms-copy-source", source_url)
            .header("Content-Length", "0")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            return Err(ApiError::UnexpectedStatus {
                operation: "blob copy start",
                status: status.as_u16(),
                expected: StatusCode::ACCEPTED.as_u16(),
            });
        }
        debug!("Server-side copy accepted");
        Ok(())
    }

    /// Read the blob's current copy state from its properties
    pub async fn copy_state(&self, blob_url: Url) -> ApiResult<CopyState> {
        let response = self.request(Method::HEAD, blob_url).await?.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::UnexpectedStatus {
                operation: "blob properties",
                status: status.as_u16(),
                expected: StatusCode::OK.as_u16(),
            });
        }
        Ok(CopyState::from_response(&response))
    }

    /// Start the copy and poll until it reaches a terminal state
    ///
    /// Sleeps `copy_wait` while no status is available and `copy_pending`
    /// while the copy is pending, reporting progress through `on_progress`
    /// on each pending poll. Never sleeps after a terminal status. A
    /// terminal state other than `success` is a delivery failure.
    pub async fn copy_and_wait(
        &self,
        blob_url: Url,
        source_url: &str,
        polling: &PollingConfig,
        mut on_progress: impl FnMut(&CopyState),
    ) -> DeliveryResult<CopyState> {
        self.start_copy_from_url(blob_url.clone(), source_url)
            .await?;

        loop {
            let state = self.copy_state(blob_url.clone()).await?;
            match classify(state.status.as_deref()) {
                CopyStep::Wait => {
                    debug!("Copy status not yet available");
                    sleep(polling.copy_wait()).await;
                }
                CopyStep::InProgress => {
                    on_progress(&state);
                    sleep(polling.copy_pending()).await;
                }
                CopyStep::Terminal => {
                    let status = state.status.clone().unwrap_or_default();
                    if status.eq_ignore_ascii_case("success") {
                        info!(
                            "Transfer ended: {} {}",
                            status,
                            state.progress.clone().unwrap_or_default()
                        );
                        return Ok(state);
                    }
                    return Err(DeliveryError::CopyFailed {
                        status,
                        description: state.description.clone().unwrap_or_default(),
                    });
                }
            }
        }
    }
}

async fn sleep(interval: Duration) {
    tokio::time::sleep(interval).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_endpoint_derivation() {
        assert_eq!(
            blob_endpoint("mystorageacct"),
            "https://mystorageacct.blob.core.windows.net"
        );
    }

    #[test]
    fn test_classify_poll_sequence() {
        // Typical observation sequence [None, "pending", "success"]: short
        // wait, longer wait, then terminal with no further sleeping.
        assert_eq!(classify(None), CopyStep::Wait);
        assert_eq!(classify(Some("pending")), CopyStep::InProgress);
        assert_eq!(classify(Some("success")), CopyStep::Terminal);
    }

    #[test]
    fn test_classify_other_terminals() {
        assert_eq!(classify(Some("failed")), CopyStep::Terminal);
        assert_eq!(classify(Some("aborted")), CopyStep::Terminal);
        assert_eq!(classify(Some("Pending")), CopyStep::InProgress);
    }

    #[test]
    fn test_sleep_intervals_for_steps() {
        let polling = PollingConfig::default();
        assert_eq!(polling.copy_wait(), Duration::from_secs(5));
        assert_eq!(polling.copy_pending(), Duration::from_secs(10));
    }

    #[test]
    fn test_blob_url_layout() {
        let client = BlobClient::new(Client::new(), Arc::new(AzureCliCredential::new()));
        let url = client
            .blob_url(
                "mystorageacct",
                "usage-final",
                "export/finalamortized/20230101-20230131/manual_load.csv",
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://mystorageacct.blob.core.windows.net/usage-final/export/finalamortized/20230101-20230131/manual_load.csv"
        );
    }
}
