//! EA Fetcher Library
//!
//! Automates extraction of Azure Enterprise Agreement billing/usage data and
//! delivery of that data to blob storage: billing account and period
//! resolution, on-demand usage generation with long-running-operation
//! polling, server-side blob copies, and one-time cost-management exports.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
