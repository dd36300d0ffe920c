// ABOUTME: Error types for batch runs.
// ABOUTME: Only scan, count and cancellation failures abort a run; group failures are counted.

use super::outcome::Summary;
use thiserror::Error;

/// Boxed error from a collaborator (operation, counter, page lister).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while enumerating work items.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The remote listing collaborator failed.
    #[error("failed to list items: {0}")]
    Listing(#[source] BoxError),

    /// Walking the local directory tree failed.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Every worker went away while items were still being produced.
    #[error("work item channel closed before the scan finished")]
    PipelineClosed,

    /// The scanner task panicked or was aborted.
    #[error("scanner task failed: {0}")]
    Aborted(String),
}

impl ScanError {
    pub fn listing(source: impl Into<BoxError>) -> Self {
        ScanError::Listing(source.into())
    }
}

/// Errors that abort a whole batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The user declined the confirmation prompt. Nothing was processed.
    #[error("operation cancelled")]
    Cancelled,

    /// The item counter failed before anything was scanned.
    #[error("failed to count items: {0}")]
    Count(#[source] BoxError),

    /// The scanner failed. Items discovered before the failure were still
    /// processed and are tallied in `summary`.
    #[error("{source}")]
    Scan { source: ScanError, summary: Summary },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchErrorKind {
    Cancelled,
    Count,
    Scan,
}

impl BatchError {
    pub fn kind(&self) -> BatchErrorKind {
        match self {
            BatchError::Cancelled => BatchErrorKind::Cancelled,
            BatchError::Count(_) => BatchErrorKind::Count,
            BatchError::Scan { .. } => BatchErrorKind::Scan,
        }
    }

    /// What was processed before the run failed, if anything was.
    pub fn partial_summary(&self) -> Option<&Summary> {
        match self {
            BatchError::Scan { summary, .. } => Some(summary),
            _ => None,
        }
    }
}
