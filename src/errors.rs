//! Error types for the EA fetcher
//!
//! Errors are grouped by the component that produces them and rolled up into
//! a single [`AppError`] at the application boundary. Messages are written to
//! be actionable from the command line.

use thiserror::Error;

/// Authentication and token-acquisition errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// The `az` CLI binary could not be executed
    #[error("Failed to run the Azure CLI. Is 'az' installed and on PATH?")]
    CliUnavailable(#[from] std::io::Error),

    /// The `az` CLI exited with a failure status
    #[error("Azure CLI login session unavailable: {stderr}. Run 'az login' and retry")]
    NotLoggedIn { stderr: String },

    /// Token JSON could not be parsed
    #[error("Unexpected token response from the Azure CLI")]
    TokenParse(#[from] serde_json::Error),

    /// Token JSON carried no usable expiry field
    #[error("Token response carried neither 'expires_on' nor 'expiresIn'")]
    MissingExpiry,

    /// No default subscription is selected in the CLI profile
    #[error("No default subscription in the Azure CLI profile. Run 'az account set'")]
    NoDefaultSubscription,
}

/// Errors from raw management-plane and storage-plane HTTP calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level request failure
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// A URL could not be assembled
    #[error("Invalid request URL: {url}")]
    InvalidUrl { url: String },

    /// The service answered with a status other than the single expected one
    #[error("{operation} failed: HTTP {status} (expected {expected})")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        expected: u16,
    },

    /// A response body did not deserialize into the expected shape
    #[error("Malformed response body from {operation}")]
    MalformedBody {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A long-running operation reached a failure terminal state
    #[error("Long-running operation ended in state '{status}'")]
    OperationFailed { status: String },

    /// A long-running operation finished without producing a result payload
    #[error("Operation completed but returned no download URL")]
    MissingResult,
}

/// Billing account and billing period resolution errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// The identity can see no Enterprise Agreement accounts
    #[error("No Enterprise Agreement account access detected on this user.")]
    NoEligibleAccount,

    /// The identity can see several accounts and none was chosen
    #[error(
        "Multiple Enterprise Agreement account access detected on this user. \
         You must specify the account with --account= ."
    )]
    MultipleEligibleAccounts { count: usize },

    /// A requested period name is outside the lookup window
    #[error("Billing period '{name}' not found among the most recent {window} periods")]
    PeriodNotFound { name: String, window: usize },

    /// Auto-selection exhausted its candidates
    #[error(
        "None of the most recent {window} billing periods has closed yet (grace {grace_days} days)"
    )]
    NoClosedPeriod { window: usize, grace_days: i64 },

    /// A period object came back without both boundary dates
    #[error("Billing period '{name}' is missing a start or end date")]
    IncompletePeriod { name: String },

    /// Underlying API failure during resolution
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Blob delivery errors (Pipeline A)
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Underlying API failure while starting or polling the copy
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server-side copy ended in a non-success terminal state
    #[error("Blob copy ended in state '{status}': {description}")]
    CopyFailed { status: String, description: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: std::path::PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file")]
    Io(#[from] std::io::Error),

    /// Invalid TOML
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic application error with context
    #[error("{message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Whether this failure is something the user can fix before rerunning
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            AppError::Auth(AuthError::NotLoggedIn { .. })
                | AppError::Auth(AuthError::NoDefaultSubscription)
                | AppError::Billing(BillingError::NoEligibleAccount)
                | AppError::Billing(BillingError::MultipleEligibleAccounts { .. })
                | AppError::Billing(BillingError::PeriodNotFound { .. })
                | AppError::Config(_)
        )
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Api(_) => "api",
            AppError::Billing(_) => "billing",
            AppError::Delivery(_) => "delivery",
            AppError::Config(_) => "config",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Raw API call result type alias
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Billing resolution result type alias
pub type BillingResult<T> = std::result::Result<T, BillingError>;

/// Delivery result type alias
pub type DeliveryResult<T> = std::result::Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_resolution_messages_are_user_actionable() {
        let none = AppError::Billing(BillingError::NoEligibleAccount);
        let many = AppError::Billing(BillingError::MultipleEligibleAccounts { count: 3 });

        assert!(none.is_user_actionable());
        assert!(many.is_user_actionable());
        assert!(many.to_string().contains("--account"));
    }

    #[test]
    fn test_unexpected_status_message() {
        let err = ApiError::UnexpectedStatus {
            operation: "export create",
            status: 409,
            expected: 201,
        };
        assert_eq!(
            err.to_string(),
            "export create failed: HTTP 409 (expected 201)"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            AppError::Billing(BillingError::NoEligibleAccount).category(),
            "billing"
        );
        assert_eq!(AppError::generic("boom").category(), "generic");
    }
}
