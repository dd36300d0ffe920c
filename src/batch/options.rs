// ABOUTME: Per-invocation batch options.
// ABOUTME: Built once from CLI flags and shared read-only with every worker.

use std::num::NonZeroUsize;

/// Default number of concurrent workers.
pub const DEFAULT_CONCURRENCY: NonZeroUsize = NonZeroUsize::new(2).unwrap();

/// Immutable configuration for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Number of concurrent workers.
    pub concurrency: NonZeroUsize,
    /// Simulate the run: no remote call is made, every group counts as succeeded.
    pub dry_run: bool,
    /// Skip the confirmation prompt.
    pub force: bool,
    /// Hide the progress indicator.
    pub no_progress: bool,
}

impl BatchOptions {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self {
            concurrency,
            dry_run: false,
            force: false,
            no_progress: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn no_progress(mut self, no_progress: bool) -> Self {
        self.no_progress = no_progress;
        self
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}
