//! Token acquisition through the Azure CLI
//!
//! Shells out to `az account get-access-token` for each resource, caching the
//! result until shortly before expiry. The expiry field handling accepts both
//! the regular CLI shape (`expires_on` as a Unix timestamp) and the
//! cloud-shell shape, which only reports a relative `expiresIn` — the latter
//! is the fallback, not an error.

use std::collections::HashMap;
use std::process::Output;
use std::sync::Mutex;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::constants::auth::TOKEN_REFRESH_MARGIN;
use crate::errors::{AuthError, AuthResult};

/// A bearer token scoped to one resource
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// The raw token value for the `Authorization` header
    pub token: String,
    /// Instant past which the token must not be used
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token is still comfortably inside its validity window
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let margin = ChronoDuration::from_std(TOKEN_REFRESH_MARGIN)
            .unwrap_or_else(|_| ChronoDuration::seconds(300));
        now + margin < self.expires_at
    }
}

/// Raw token JSON as emitted by `az account get-access-token`
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    /// Unix timestamp, present on regular CLI installs
    #[serde(rename = "expires_on")]
    expires_on: Option<i64>,
    /// Relative lifetime in seconds, the only field cloud-shell provides
    #[serde(rename = "expiresIn")]
    expires_in: Option<i64>,
}

impl TokenResponse {
    /// Resolve the absolute expiry instant, preferring `expires_on`
    fn expiry(&self, now: DateTime<Utc>) -> AuthResult<DateTime<Utc>> {
        if let Some(epoch) = self.expires_on {
            if let Some(at) = DateTime::from_timestamp(epoch, 0) {
                return Ok(at);
            }
        }
        if let Some(secs) = self.expires_in {
            return Ok(now + ChronoDuration::seconds(secs));
        }
        Err(AuthError::MissingExpiry)
    }
}

/// Credential provider backed by the logged-in Azure CLI profile
///
/// One instance is shared across a pipeline run; tokens are cached per
/// resource. An optional subscription override applies to every token this
/// provider issues, which is how storage access against a non-default
/// subscription is expressed.
#[derive(Debug, Default)]
pub struct AzureCliCredential {
    subscription: Option<String>,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl AzureCliCredential {
    /// Provider for the profile's default subscription
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider pinned to a specific subscription
    pub fn for_subscription(subscription: impl Into<String>) -> Self {
        Self {
            subscription: Some(subscription.into()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Get a token for `resource`, reusing a cached one while fresh
    pub async fn get_token(&self, resource: &str) -> AuthResult<AccessToken> {
        let now = Utc::now();
        if let Some(cached) = self.cached(resource) {
            if cached.is_fresh(now) {
                trace!("Reusing cached token for {}", resource);
                return Ok(cached);
            }
            debug!("Cached token for {} near expiry, refreshing", resource);
        }

        let token = self.acquire(resource, now).await?;
        self.cache
            .lock()
            .expect("token cache poisoned")
            .insert(resource.to_string(), token.clone());
        Ok(token)
    }

    fn cached(&self, resource: &str) -> Option<AccessToken> {
        self.cache
            .lock()
            .expect("token cache poisoned")
            .get(resource)
            .cloned()
    }

    async fn acquire(&self, resource: &str, now: DateTime<Utc>) -> AuthResult<AccessToken> {
        let mut command = Command::new("az");
        command
            .args(["account", "get-access-token", "--output", "json"])
            .args(["--resource", resource]);
        if let Some(subscription) = &self.subscription {
            command.args(["--subscription", subscription]);
        }

        debug!("Acquiring token for {}", resource);
        let output = command.output().await?;
        let stdout = checked_stdout(output)?;

        let response: TokenResponse = serde_json::from_slice(&stdout)?;
        let expires_at = response.expiry(now)?;
        Ok(AccessToken {
            token: response.access_token,
            expires_at,
        })
    }

    /// Subscription id the billing-period listing should be scoped to
    ///
    /// Uses the explicit override when set, otherwise asks the CLI profile
    /// for its current default subscription.
    pub async fn subscription_id(&self) -> AuthResult<String> {
        if let Some(subscription) = &self.subscription {
            return Ok(subscription.clone());
        }

        #[derive(Deserialize)]
        struct Account {
            id: String,
        }

        let output = Command::new("az")
            .args(["account", "show", "--output", "json"])
            .output()
            .await?;
        let stdout = checked_stdout(output)?;

        let account: Account =
            serde_json::from_slice(&stdout).map_err(|_| AuthError::NoDefaultSubscription)?;
        Ok(account.id)
    }
}

/// Map a failed `az` invocation to an actionable error
fn checked_stdout(output: Output) -> AuthResult<Vec<u8>> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(AuthError::NotLoggedIn { stderr });
    }
    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2023-02-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_expiry_prefers_expires_on() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"accessToken": "t", "expires_on": 1675700000, "expiresIn": 60}"#,
        )
        .unwrap();

        let at = response.expiry(now()).unwrap();
        assert_eq!(at.timestamp(), 1675700000);
    }

    #[test]
    fn test_expiry_falls_back_to_expires_in() {
        // Cloud-shell token shape: no absolute timestamp at all
        let response: TokenResponse =
            serde_json::from_str(r#"{"accessToken": "t", "expiresIn": 3600}"#).unwrap();

        let at = response.expiry(now()).unwrap();
        assert_eq!(at - now(), ChronoDuration::seconds(3600));
    }

    #[test]
    fn test_expiry_missing_both_fields() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"accessToken": "t"}"#).unwrap();

        assert!(matches!(
            response.expiry(now()),
            Err(AuthError::MissingExpiry)
        ));
    }

    #[test]
    fn test_token_freshness_margin() {
        let token = AccessToken {
            token: "t".to_string(),
            expires_at: now() + ChronoDuration::seconds(600),
        };
        // 600s left, 300s margin: still fresh
        assert!(token.is_fresh(now()));
        // 100s left: must refresh
        assert!(!token.is_fresh(now() + ChronoDuration::seconds(500)));
    }

    #[test]
    fn test_for_subscription_is_pinned() {
        let credential = AzureCliCredential::for_subscription("sub-123");
        assert_eq!(credential.subscription.as_deref(), Some("sub-123"));
    }
}
