//! Application constants for the EA fetcher
//!
//! Centralizes endpoints, API versions, and polling cadences used throughout
//! the application, organized by functional domain.

use std::time::Duration;

/// Azure Resource Manager endpoints and resources
pub mod arm {
    /// Management-plane base URL
    pub const MANAGEMENT_BASE_URL: &str = "https://management.azure.com";

    /// Token resource for management-plane calls
    pub const MANAGEMENT_RESOURCE: &str = "https://management.azure.com/";

    /// Token resource for storage data-plane calls
    pub const STORAGE_RESOURCE: &str = "https://storage.azure.com/";
}

/// API versions for the management-plane endpoints in use
///
/// These are pinned to the versions the endpoints actually serve; the raw
/// billing-account, export-create and export-run calls exist precisely
/// because no stable typed surface covers them at these versions.
pub mod api_versions {
    /// Billing accounts enumeration
    pub const BILLING_ACCOUNTS: &str = "2019-10-01-preview";

    /// Subscription-scoped billing periods
    pub const BILLING_PERIODS: &str = "2018-03-01-preview";

    /// Consumption usage-details download
    pub const USAGE_DETAILS: &str = "2019-10-01";

    /// Cost-management exports
    pub const EXPORTS: &str = "2020-06-01";
}

/// Billing-account and billing-period resolution
pub mod billing {
    /// Agreement type an account must carry to be eligible
    pub const ELIGIBLE_AGREEMENT_TYPE: &str = "EnterpriseAgreement";

    /// Days past a period's end date before it is considered safely closed
    pub const PERIOD_GRACE_DAYS: i64 = 5;

    /// Lookback window for auto-selection (most recent N periods)
    pub const AUTO_SELECT_WINDOW: usize = 5;

    /// Lookback window for explicit period-name lookup
    pub const NAME_LOOKUP_WINDOW: usize = 36;
}

/// Usage-details generation (Pipeline A)
pub mod usage {
    use super::Duration;

    /// Cost metric requested from the usage-details endpoint
    pub const METRIC: &str = "amortizedcost";

    /// Interval between polls of the generation operation
    pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

    /// Terminal states of the generation operation
    pub const FINISHED_STATES: [&str; 4] = ["succeeded", "completed", "failed", "canceled"];

    /// Terminal states that count as success
    pub const SUCCEEDED_STATES: [&str; 2] = ["succeeded", "completed"];
}

/// Blob delivery layout and copy polling (Pipeline A)
pub mod delivery {
    use super::Duration;

    /// Destination container for delivered usage data
    pub const CONTAINER: &str = "usage-final";

    /// Path prefix inside the container, ahead of the per-period label
    pub const BLOB_PREFIX: &str = "export/finalamortized";

    /// Fixed file name of the delivered blob
    pub const BLOB_NAME: &str = "manual_load.csv";

    /// Blob service REST version header value
    pub const BLOB_SERVICE_VERSION: &str = "2021-08-06";

    /// Sleep while the copy status is not yet available
    pub const COPY_WAIT_INTERVAL: Duration = Duration::from_secs(5);

    /// Sleep while the copy status is "pending"
    pub const COPY_PENDING_INTERVAL: Duration = Duration::from_secs(10);
}

/// One-time export creation (Pipeline B)
pub mod export {
    /// Prefix of generated export names
    pub const NAME_PREFIX: &str = "onetime";

    /// Destination container of the export
    pub const CONTAINER: &str = "usage-final";

    /// Root folder inside the destination container
    pub const ROOT_FOLDER: &str = "export";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "ea-fetcher/0.2 (EA Usage Extraction Tool)";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 8;
}

/// Token acquisition
pub mod auth {
    use super::Duration;

    /// Refresh a cached token when it is this close to expiry
    pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);
}

// Re-export commonly used constants for convenience
pub use arm::{MANAGEMENT_BASE_URL, MANAGEMENT_RESOURCE, STORAGE_RESOURCE};
pub use billing::{ELIGIBLE_AGREEMENT_TYPE, PERIOD_GRACE_DAYS};
pub use http::USER_AGENT;
