// ABOUTME: Live progress display for batch runs.
// ABOUTME: A bounded bar when the total is known, a spinner otherwise; drawn to stderr.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({per_sec}, {eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {pos} processed ({per_sec})";

/// Progress indicator advanced by the coordinator's drain loop.
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    /// `total` is the expected number of items when a counter was available.
    pub fn new(total: Option<u64>, hidden: bool) -> Self {
        let target = if hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };

        let bar = match total {
            Some(len) => {
                let bar = ProgressBar::with_draw_target(Some(len), target);
                bar.set_style(
                    ProgressStyle::with_template(BAR_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("#>-"),
                );
                bar
            }
            None => {
                let bar = ProgressBar::with_draw_target(None, target);
                bar.set_style(
                    ProgressStyle::with_template(SPINNER_TEMPLATE)
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        };

        Self { bar }
    }

    pub fn advance(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}
