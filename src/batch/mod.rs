// ABOUTME: Batch execution engine: scanner, worker pool, coordinator and confirmation gate.
// ABOUTME: Items flow scanner -> workers -> coordinator over rendezvous channels.

mod confirm;
mod coordinator;
mod error;
mod options;
mod outcome;
mod progress;
mod scanner;
mod worker;

pub use confirm::{Answer, Confirm, ConfirmationGate, FixedAnswer, parse_answer};
pub use coordinator::{BatchJob, run};
pub use error::{BatchError, BatchErrorKind, BoxError, ScanError};
pub use options::{BatchOptions, DEFAULT_CONCURRENCY};
pub use outcome::{OperationOutcome, Summary};
pub use progress::BatchProgress;
pub use scanner::{Counter, FilesystemScanner, Page, PageLister, RemoteListingScanner, Scanner};
pub use worker::{Operation, WorkerPool, start_workers};
