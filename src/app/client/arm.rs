//! Low-level Azure Resource Manager client
//!
//! Several endpoints this tool needs (billing-account enumeration, export
//! creation, export triggering, the corrected usage-details download) have no
//! stable typed surface at the API versions in use, so every management-plane
//! call goes through this raw client: build a URL from a path template,
//! attach the `api-version` query parameter, send with a bearer token, and
//! check the response status against a single expected value. Error bodies
//! are not parsed.

use std::sync::Arc;

use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, trace};
use url::Url;

use crate::auth::AzureCliCredential;
use crate::constants::arm;
use crate::errors::{ApiError, ApiResult, AuthError};

/// Substitute `{name}` placeholders in a path template
///
/// Parameter values are inserted verbatim; callers pass path segments that
/// are already URL-safe (account ids, period names, resource ids).
pub fn format_path(template: &str, params: &[(&str, &str)]) -> String {
    let mut path = template.to_string();
    for (name, value) in params {
        path = path.replace(&format!("{{{name}}}"), value);
    }
    path
}

/// Raw management-plane client
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: Client,
    credential: Arc<AzureCliCredential>,
}

impl ArmClient {
    /// Create a client over a shared HTTP client and credential provider
    pub fn new(http: Client, credential: Arc<AzureCliCredential>) -> Self {
        Self { http, credential }
    }

    /// The credential provider this client authenticates with
    pub fn credential(&self) -> &AzureCliCredential {
        &self.credential
    }

    /// Build an absolute management-plane URL with its `api-version`
    pub fn build_url(&self, path: &str, api_version: &str) -> ApiResult<Url> {
        let raw = format!("{}{}", arm::MANAGEMENT_BASE_URL, path);
        let mut url = Url::parse(&raw).map_err(|_| ApiError::InvalidUrl { url: raw })?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Send a request and insist on a single expected status code
    ///
    /// Returns the raw response so callers can read headers (needed for
    /// long-running operations) or bodies as they see fit.
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl Serialize + ?Sized)>,
        operation: &'static str,
        expected: &[StatusCode],
    ) -> ApiResult<Response> {
        let token = self
            .credential
            .get_token(arm::MANAGEMENT_RESOURCE)
            .await
            .map_err(auth_to_api)?;

        trace!("{} {} {}", operation, method, url);
        let mut request = self.http.request(method, url).bearer_auth(&token.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("{}: HTTP {}", operation, status.as_u16());

        if !expected.contains(&status) {
            return Err(ApiError::UnexpectedStatus {
                operation,
                status: status.as_u16(),
                expected: expected.first().map(|s| s.as_u16()).unwrap_or(200),
            });
        }
        Ok(response)
    }

    /// GET a JSON document from a management-plane path
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
        operation: &'static str,
    ) -> ApiResult<T> {
        let url = self.build_url(path, api_version)?;
        let response = self
            .send(Method::GET, url, None::<&()>, operation, &[StatusCode::OK])
            .await?;
        let raw = response.bytes().await?;
        serde_json::from_slice(&raw).map_err(|source| ApiError::MalformedBody { operation, source })
    }
}

/// Token failures inside an API call surface as a request failure
fn auth_to_api(err: AuthError) -> ApiError {
    ApiError::OperationFailed {
        status: format!("token acquisition failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_path_substitution() {
        let path = format_path(
            "/providers/Microsoft.Billing/billingAccounts/{account}/providers/Microsoft.Billing/billingPeriods/{period}",
            &[("account", "1234"), ("period", "202301")],
        );
        assert_eq!(
            path,
            "/providers/Microsoft.Billing/billingAccounts/1234/providers/Microsoft.Billing/billingPeriods/202301"
        );
    }

    #[test]
    fn test_format_path_no_params() {
        let template = "/providers/Microsoft.Billing/billingAccounts";
        assert_eq!(format_path(template, &[]), template);
    }

    #[test]
    fn test_build_url_attaches_api_version() {
        let client = ArmClient::new(
            Client::new(),
            Arc::new(AzureCliCredential::new()),
        );
        let url = client
            .build_url("/providers/Microsoft.Billing/billingAccounts", "2019-10-01-preview")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/providers/Microsoft.Billing/billingAccounts?api-version=2019-10-01-preview"
        );
    }
}
