//! Command-line interface components
//!
//! Argument parsing, poll-progress display, and the per-pipeline command
//! handlers.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, Commands, ExportArgs, GlobalArgs, PullArgs};
pub use commands::{handle_export, handle_pull};
pub use progress::PollSpinner;
