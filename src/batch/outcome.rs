// ABOUTME: Per-group operation outcomes and the final batch summary.
// ABOUTME: Outcomes are folded into the summary by the coordinator's drain loop.

use super::error::BoxError;
use serde::Serialize;

/// Result of processing one group of work items.
///
/// `ok + not_ok` equals the size of the group that produced it.
#[derive(Debug, Default)]
pub struct OperationOutcome {
    pub ok: usize,
    pub not_ok: usize,
    /// Last error seen while processing the group.
    pub error: Option<BoxError>,
}

impl OperationOutcome {
    /// All `count` items succeeded.
    pub fn succeeded(count: usize) -> Self {
        Self {
            ok: count,
            not_ok: 0,
            error: None,
        }
    }

    /// All `count` items failed with the same error.
    pub fn failed(count: usize, error: impl Into<BoxError>) -> Self {
        Self {
            ok: 0,
            not_ok: count,
            error: Some(error.into()),
        }
    }

    /// Fold the result of a single item into this outcome.
    pub fn record<E: Into<BoxError>>(&mut self, result: Result<(), E>) {
        match result {
            Ok(()) => self.ok += 1,
            Err(e) => {
                self.not_ok += 1;
                self.error = Some(e.into());
            }
        }
    }

    /// Number of items this outcome accounts for.
    pub fn processed(&self) -> usize {
        self.ok + self.not_ok
    }
}

/// Final tally of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub success_count: usize,
    pub failure_count: usize,
}

impl Summary {
    pub fn add(&mut self, outcome: &OperationOutcome) {
        self.success_count += outcome.ok;
        self.failure_count += outcome.not_ok;
    }

    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }

    pub fn has_failures(&self) -> bool {
        self.failure_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_last_error() {
        let mut outcome = OperationOutcome::default();
        outcome.record::<BoxError>(Ok(()));
        outcome.record::<BoxError>(Err("first".into()));
        outcome.record::<BoxError>(Err("second".into()));
        outcome.record::<BoxError>(Ok(()));

        assert_eq!(outcome.ok, 2);
        assert_eq!(outcome.not_ok, 2);
        assert_eq!(outcome.processed(), 4);
        assert_eq!(outcome.error.unwrap().to_string(), "second");
    }

    #[test]
    fn summary_folds_outcomes() {
        let mut summary = Summary::default();
        summary.add(&OperationOutcome::succeeded(3));
        summary.add(&OperationOutcome::failed(2, "boom"));

        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failure_count, 2);
        assert_eq!(summary.total(), 5);
        assert!(summary.has_failures());
    }
}
