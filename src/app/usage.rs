//! On-demand usage-details generation (Pipeline A)
//!
//! Submits a usage-details download request for a billing account + billing
//! period scope and polls the resulting long-running operation until it
//! produces a signed download URL.
//!
//! Two service quirks are handled natively here rather than by patching
//! anything at runtime: the download endpoint, although documented as a POST,
//! only answers the request correctly as an HTTP GET, and its operation
//! reports the non-standard terminal status `completed` alongside the usual
//! `succeeded`.

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::app::client::{format_path, ArmClient};
use crate::app::models::UsageDownload;
use crate::constants::{api_versions, usage};
use crate::errors::{ApiError, ApiResult};

const DOWNLOAD_PATH: &str = "/providers/Microsoft.Billing/billingAccounts/{account}\
/providers/Microsoft.Billing/billingPeriods/{period}\
/providers/Microsoft.Consumption/usageDetails/download";

/// Whether an operation status string is terminal
pub fn is_finished(status: &str) -> bool {
    usage::FINISHED_STATES
        .iter()
        .any(|s| status.eq_ignore_ascii_case(s))
}

/// Whether a terminal operation status counts as success
pub fn is_succeeded(status: &str) -> bool {
    usage::SUCCEEDED_STATES
        .iter()
        .any(|s| status.eq_ignore_ascii_case(s))
}

/// Operation status document polled from the async-operation endpoint
#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: Option<String>,
    #[serde(default)]
    properties: Option<DownloadProperties>,
}

/// Download result payload, present once the operation has succeeded
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DownloadProperties {
    download_url: Option<String>,
    valid_till: Option<String>,
}

/// Response body of the download request itself (immediate 200 case)
#[derive(Debug, Deserialize)]
struct DownloadResponse {
    #[serde(default)]
    properties: Option<DownloadProperties>,
}

/// Generate usage data for one billing period and return its download URL
///
/// Polls every `poll_interval` (30 s by default; generation typically takes
/// 5 to 10 minutes), reporting each observed status through `on_status`.
/// A terminal failure status of the operation is propagated as an error.
pub async fn generate_usage_download(
    arm: &ArmClient,
    account: &str,
    period: &str,
    poll_interval: Duration,
    mut on_status: impl FnMut(&str),
) -> ApiResult<UsageDownload> {
    let path = format_path(DOWNLOAD_PATH, &[("account", account), ("period", period)]);
    let mut url = arm.build_url(&path, api_versions::USAGE_DETAILS)?;
    url.query_pairs_mut().append_pair("metric", usage::METRIC);

    // Corrected request shape: GET, not the documented POST
    let response = arm
        .send(
            Method::GET,
            url,
            None::<&()>,
            "usage download request",
            &[StatusCode::OK, StatusCode::ACCEPTED],
        )
        .await?;

    if response.status() == StatusCode::OK {
        // Generation finished synchronously
        let raw = response.bytes().await?;
        let body: DownloadResponse =
            serde_json::from_slice(&raw).map_err(|source| ApiError::MalformedBody {
                operation: "usage download request",
                source,
            })?;
        return into_download(body.properties);
    }

    let poll_url = operation_url(&response)?;
    let location = header_url(&response, "location");
    debug!("Polling usage generation at {}", poll_url);

    let final_status = loop {
        tokio::time::sleep(poll_interval).await;

        let response = arm
            .send(
                Method::GET,
                poll_url.clone(),
                None::<&()>,
                "usage generation poll",
                &[StatusCode::OK, StatusCode::ACCEPTED],
            )
            .await?;
        let raw = response.bytes().await?;
        // A Location-style poll answers 202 with an empty body while the
        // operation is still running
        let body: OperationStatus = if raw.is_empty() {
            OperationStatus {
                status: None,
                properties: None,
            }
        } else {
            serde_json::from_slice(&raw).map_err(|source| ApiError::MalformedBody {
                operation: "usage generation poll",
                source,
            })?
        };

        let status = body.status.unwrap_or_else(|| "InProgress".to_string());
        on_status(&status);

        if is_finished(&status) {
            break (status, body.properties);
        }
    };

    let (status, properties) = final_status;
    if !is_succeeded(&status) {
        return Err(ApiError::OperationFailed { status });
    }

    // The terminal status document usually carries the result inline; fall
    // back to the Location URL when it does not.
    if let Some(properties) = properties {
        if properties.download_url.is_some() {
            return into_download(Some(properties));
        }
    }
    if let Some(location) = location {
        let response = arm
            .send(
                Method::GET,
                location,
                None::<&()>,
                "usage download result",
                &[StatusCode::OK],
            )
            .await?;
        let raw = response.bytes().await?;
        let body: DownloadResponse =
            serde_json::from_slice(&raw).map_err(|source| ApiError::MalformedBody {
                operation: "usage download result",
                source,
            })?;
        return into_download(body.properties);
    }

    Err(ApiError::MissingResult)
}

fn into_download(properties: Option<DownloadProperties>) -> ApiResult<UsageDownload> {
    let properties = properties.ok_or(ApiError::MissingResult)?;
    let download_url = properties.download_url.ok_or(ApiError::MissingResult)?;
    info!("Got URL to generated usage blob");
    Ok(UsageDownload {
        download_url,
        valid_till: properties.valid_till,
    })
}

/// The polling URL of the long-running operation behind a 202 response
fn operation_url(response: &reqwest::Response) -> ApiResult<Url> {
    header_url(response, "azure-asyncoperation")
        .or_else(|| header_url(response, "location"))
        .ok_or_else(|| ApiError::InvalidUrl {
            url: "<missing Azure-AsyncOperation/Location header>".to_string(),
        })
}

fn header_url(response: &reqwest::Response, name: &str) -> Option<Url> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Url::parse(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_vocabulary_includes_completed() {
        for status in ["succeeded", "Succeeded", "completed", "Completed"] {
            assert!(is_finished(status), "{status} should be terminal");
            assert!(is_succeeded(status), "{status} should be success");
        }
    }

    #[test]
    fn test_failure_terminals() {
        for status in ["failed", "canceled"] {
            assert!(is_finished(status));
            assert!(!is_succeeded(status));
        }
    }

    #[test]
    fn test_in_progress_is_not_terminal() {
        for status in ["InProgress", "running", "notstarted"] {
            assert!(!is_finished(status));
        }
    }

    #[test]
    fn test_status_document_with_inline_result() {
        let body: OperationStatus = serde_json::from_str(
            r#"{
                "status": "Completed",
                "properties": {
                    "downloadUrl": "https://example.blob.core.windows.net/sas",
                    "validTill": "2023-02-06T18:00:00Z"
                }
            }"#,
        )
        .unwrap();

        let download = into_download(body.properties).unwrap();
        assert_eq!(
            download.download_url,
            "https://example.blob.core.windows.net/sas"
        );
        assert_eq!(download.valid_till.as_deref(), Some("2023-02-06T18:00:00Z"));
    }

    #[test]
    fn test_missing_result_payload_is_error() {
        assert!(matches!(
            into_download(None),
            Err(ApiError::MissingResult)
        ));
        let empty = DownloadProperties {
            download_url: None,
            valid_till: None,
        };
        assert!(matches!(
            into_download(Some(empty)),
            Err(ApiError::MissingResult)
        ));
    }
}
