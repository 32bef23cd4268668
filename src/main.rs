//! EA Fetcher CLI application
//!
//! Command-line interface for pulling Azure Enterprise Agreement usage data
//! into blob storage, either by on-demand generation plus server-side copy
//! or by one-time cost-management exports.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ea_fetcher::cli::{handle_export, handle_pull, Cli, Commands};
use ea_fetcher::config::FetcherConfig;
use ea_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    init_logging(&cli);

    info!("EA Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    let config = FetcherConfig::load(cli.global.config.as_deref())?;
    let quiet = cli.global.quiet;

    match cli.command {
        Commands::Pull(args) => {
            info!("Executing pull command");
            handle_pull(args, config, quiet).await
        }
        Commands::Export(args) => {
            info!("Executing export command");
            handle_export(args, config, quiet).await
        }
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("ea_fetcher={}", log_level).parse().expect("valid directive"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();
}
