//! Command-line argument parsing for the EA fetcher
//!
//! Defines the CLI structure using clap derive macros: two subcommands, one
//! per pipeline, sharing account and period selection arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// EA Fetcher - pull Azure Enterprise Agreement usage data into blob storage
#[derive(Parser, Debug)]
#[command(
    name = "ea_fetcher",
    version,
    about = "Extract Azure Enterprise Agreement usage data into blob storage",
    long_about = "Automates extraction of Azure Enterprise Agreement billing/usage data.
'pull' generates usage data on demand and copies it into a storage account;
'export' creates and triggers a one-time cost-management export."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate usage data on demand and copy it into a storage account
    Pull(PullArgs),

    /// Create and trigger a one-time cost-management export
    Export(ExportArgs),
}

/// Arguments for the pull command (Pipeline A)
#[derive(Args, Debug, Clone)]
pub struct PullArgs {
    /// Destination storage account name
    #[arg(short = 's', long = "storage", value_name = "ACCOUNT")]
    pub storage_account_name: String,

    /// CLI subscription to use for storage access (defaults to the profile's)
    #[arg(long = "storage-subscription", value_name = "SUBSCRIPTION")]
    pub storage_account_subscription: Option<String>,

    /// EA billing account number (auto-detected when omitted)
    #[arg(short = 'a', long = "account", value_name = "NUMBER")]
    pub billing_account_name: Option<String>,

    /// Billing period names to process (auto-selects one period when omitted)
    #[arg(value_name = "PERIODS")]
    pub billing_periods: Vec<String>,
}

/// Arguments for the export command (Pipeline B)
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Destination storage resource id
    #[arg(short = 's', long = "storage", value_name = "RESOURCE_ID")]
    pub storage_resource_id: String,

    /// EA billing account number (auto-detected when omitted)
    #[arg(short = 'a', long = "account", value_name = "NUMBER")]
    pub billing_account_name: Option<String>,

    /// Billing period names to process (auto-selects one period when omitted)
    #[arg(value_name = "PERIODS")]
    pub billing_periods: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
