//! HTTP client construction and the raw management-plane call surface

pub mod arm;
pub mod config;

pub use arm::{format_path, ArmClient};
pub use config::ClientConfig;
