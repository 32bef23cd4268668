//! Core application logic for the EA fetcher
//!
//! Billing resolution, usage generation, export creation and blob delivery,
//! all sequential: periods are processed strictly one at a time and every
//! failure halts the run. The only suspension points are the fixed-interval
//! sleeps inside the two poll loops.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ea_fetcher::app::{billing, ArmClient, ClientConfig};
//! use ea_fetcher::auth::AzureCliCredential;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = ClientConfig::default().build_http_client()?;
//! let arm = ArmClient::new(http, Arc::new(AzureCliCredential::new()));
//!
//! let accounts = billing::list_eligible_accounts(&arm).await?;
//! let account = billing::resolve_account(None, accounts)?;
//! println!("Account Selected: {account}");
//! # Ok(())
//! # }
//! ```

pub mod billing;
pub mod blob;
pub mod client;
pub mod export;
pub mod models;
pub mod usage;

// Re-export commonly used types
pub use blob::{BlobClient, CopyState};
pub use client::{ArmClient, ClientConfig};
pub use models::{BillingAccount, BillingPeriod, UsageDownload};
