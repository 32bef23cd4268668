//! Authentication against the ambient Azure CLI login
//!
//! Tokens are acquired from the logged-in `az` session and handed to each
//! operation through an explicit [`AzureCliCredential`] value; nothing in the
//! crate reads ambient global credential state directly.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ea_fetcher::auth::AzureCliCredential;
//! use ea_fetcher::constants::arm;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credential = AzureCliCredential::new();
//! let token = credential.get_token(arm::MANAGEMENT_RESOURCE).await?;
//! println!("token valid until {}", token.expires_at);
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{AccessToken, AzureCliCredential};
