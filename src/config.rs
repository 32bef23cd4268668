//! Runtime configuration
//!
//! Polling cadences and the delivery layout default to the values in
//! [`crate::constants`] and can be overridden from an optional TOML file
//! selected with the global `--config` flag. Everything else (endpoints,
//! API versions) is fixed.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{delivery, usage};
use crate::errors::ConfigError;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Poll intervals for long-running operations
    pub polling: PollingConfig,
    /// Destination layout for delivered usage blobs
    pub delivery: DeliveryConfig,
}

/// Poll intervals, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Between polls of the usage-generation operation
    pub usage_poll_secs: u64,
    /// While the blob copy status is not yet available
    pub copy_wait_secs: u64,
    /// While the blob copy status is "pending"
    pub copy_pending_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            usage_poll_secs: usage::POLL_INTERVAL.as_secs(),
            copy_wait_secs: delivery::COPY_WAIT_INTERVAL.as_secs(),
            copy_pending_secs: delivery::COPY_PENDING_INTERVAL.as_secs(),
        }
    }
}

impl PollingConfig {
    /// Usage-generation poll interval
    pub fn usage_poll(&self) -> Duration {
        Duration::from_secs(self.usage_poll_secs)
    }

    /// Copy-not-yet-started poll interval
    pub fn copy_wait(&self) -> Duration {
        Duration::from_secs(self.copy_wait_secs)
    }

    /// Copy-pending poll interval
    pub fn copy_pending(&self) -> Duration {
        Duration::from_secs(self.copy_pending_secs)
    }
}

/// Destination layout for Pipeline A deliveries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Destination container name
    pub container: String,
    /// Path prefix ahead of the per-period label
    pub blob_prefix: String,
    /// Fixed file name of the delivered blob
    pub blob_name: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            container: delivery::CONTAINER.to_string(),
            blob_prefix: delivery::BLOB_PREFIX.to_string(),
            blob_name: delivery::BLOB_NAME.to_string(),
        }
    }
}

impl DeliveryConfig {
    /// Blob path for a given export label, e.g.
    /// `export/finalamortized/20230101-20230131/manual_load.csv`
    pub fn blob_path(&self, label: &str) -> String {
        format!("{}/{}/{}", self.blob_prefix, label, self.blob_name)
    }
}

impl FetcherConfig {
    /// Load configuration from an optional TOML file
    ///
    /// `None` yields the defaults. A named file must exist and parse.
    pub fn load(path: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                let raw = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&raw)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_constants() {
        let config = FetcherConfig::default();
        assert_eq!(config.polling.usage_poll(), Duration::from_secs(30));
        assert_eq!(config.polling.copy_wait(), Duration::from_secs(5));
        assert_eq!(config.polling.copy_pending(), Duration::from_secs(10));
        assert_eq!(config.delivery.container, "usage-final");
    }

    #[test]
    fn test_blob_path_layout() {
        let config = DeliveryConfig::default();
        assert_eq!(
            config.blob_path("20230101-20230131"),
            "export/finalamortized/20230101-20230131/manual_load.csv"
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = FetcherConfig::load(Some(Path::new("/nonexistent/ea_fetcher.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_load_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[polling]\nusage_poll_secs = 5").unwrap();

        let config = FetcherConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.polling.usage_poll(), Duration::from_secs(5));
        // Unspecified sections keep their defaults
        assert_eq!(config.polling.copy_pending(), Duration::from_secs(10));
        assert_eq!(config.delivery.blob_name, "manual_load.csv");
    }
}
