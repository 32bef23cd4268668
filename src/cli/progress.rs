//! Poll progress feedback
//!
//! Long waits (usage generation, blob copy) get a spinner with the latest
//! observed status so an interactive run is visibly alive between polls.
//! In quiet mode the spinner is suppressed and only log records remain.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner shown while a long-running operation is being polled
pub struct PollSpinner {
    bar: ProgressBar,
}

impl PollSpinner {
    /// Start a spinner with an initial message; hidden when `quiet`
    pub fn start(message: impl Into<String>, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                    .expect("static spinner template"),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        };
        bar.set_message(message.into());
        Self { bar }
    }

    /// Update the status line
    pub fn update(&self, message: impl Into<String>) {
        self.bar.set_message(message.into());
    }

    /// Stop the spinner, leaving a final line
    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }
}
