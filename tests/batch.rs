// ABOUTME: Integration tests for the batch coordinator and worker pool.
// ABOUTME: Drives whole runs through in-memory scanners, operations and confirmation gates.

mod support;

use async_trait::async_trait;
use parking_lot::Mutex;
use rokka::batch::{
    self, BatchErrorKind, BatchJob, BatchOptions, BoxError, Confirm, ConfirmationGate, Counter,
    FixedAnswer, Operation, OperationOutcome, Page, PageLister, RemoteListingScanner, ScanError,
    Scanner, Summary,
};
use rokka::types::WorkItem;
use std::collections::HashSet;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Emits a fixed list of items, optionally failing afterwards.
struct ListScanner {
    items: Vec<String>,
    fail_after: bool,
}

impl ListScanner {
    fn new(items: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            fail_after: false,
        }
    }

    fn numbered(count: usize) -> Self {
        Self::new((0..count).map(|i| format!("item-{i}")))
    }
}

#[async_trait]
impl Scanner<()> for ListScanner {
    async fn scan(&self, _client: &(), items: flume::Sender<WorkItem>) -> Result<(), ScanError> {
        for item in &self.items {
            items
                .send_async(WorkItem::new(item.clone()))
                .await
                .map_err(|_| ScanError::PipelineClosed)?;
        }
        if self.fail_after {
            return Err(ScanError::listing("listing went away"));
        }
        Ok(())
    }
}

/// Records every group it sees and fails the items named in `failing`.
#[derive(Clone, Default)]
struct RecordingOperation {
    failing: Arc<HashSet<String>>,
    groups: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RecordingOperation {
    fn failing(items: &[&str]) -> Self {
        Self {
            failing: Arc::new(items.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.groups.lock().len()
    }

    fn seen(&self) -> Vec<String> {
        let mut seen: Vec<String> = self.groups.lock().iter().flatten().cloned().collect();
        seen.sort();
        seen
    }
}

#[async_trait]
impl Operation<()> for RecordingOperation {
    async fn apply(
        &self,
        _client: &(),
        items: &[WorkItem],
        _options: &BatchOptions,
    ) -> OperationOutcome {
        self.groups
            .lock()
            .push(items.iter().map(|i| i.as_str().to_string()).collect());

        let mut outcome = OperationOutcome::default();
        for item in items {
            if self.failing.contains(item.as_str()) {
                outcome.record::<BoxError>(Err(format!("cannot process {item}").into()));
            } else {
                outcome.record::<BoxError>(Ok(()));
            }
        }
        outcome
    }
}

/// Counter and pager that track how often they were called.
#[derive(Clone, Default)]
struct CountingLister {
    count_calls: Arc<AtomicUsize>,
    page_calls: Arc<AtomicUsize>,
    fail_count: bool,
}

#[async_trait]
impl Counter<()> for CountingLister {
    async fn count(&self, _client: &()) -> Result<u64, BoxError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_count {
            return Err("count unavailable".into());
        }
        Ok(2)
    }
}

#[async_trait]
impl PageLister<()> for CountingLister {
    async fn list_page(&self, _client: &(), _cursor: &str) -> Result<Page, BoxError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Page {
            items: vec![WorkItem::from("x"), WorkItem::from("y")],
            cursor: String::new(),
        })
    }
}

fn options(concurrency: usize) -> BatchOptions {
    BatchOptions::new(NonZeroUsize::new(concurrency).unwrap()).no_progress(true)
}

async fn run_job(
    options: BatchOptions,
    job: BatchJob<()>,
    gate: &mut dyn Confirm,
) -> Result<Summary, batch::BatchError> {
    support::init_tracing();
    batch::run(Arc::new(()), options, job, gate).await
}

#[tokio::test]
async fn single_failure_is_counted() {
    let operation = RecordingOperation::failing(&["b"]);
    let job = BatchJob::new(ListScanner::new(["a", "b", "c"]), operation.clone(), 1);

    let summary = run_job(options(2), job, &mut FixedAnswer(true))
        .await
        .unwrap();

    assert_eq!(
        summary,
        Summary {
            success_count: 2,
            failure_count: 1
        }
    );
    assert_eq!(operation.seen(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn every_item_is_accounted_for() {
    for concurrency in [1, 2, 3, 8] {
        for group_size in [1, 2, 7, 100] {
            for count in [0, 1, 5, 23] {
                let operation = RecordingOperation::default();
                let job = BatchJob::new(ListScanner::numbered(count), operation.clone(), group_size);

                let summary = run_job(options(concurrency), job, &mut FixedAnswer(true))
                    .await
                    .unwrap();

                assert_eq!(
                    summary.total(),
                    count,
                    "C={concurrency} G={group_size} M={count}"
                );
                assert_eq!(operation.seen().len(), count);
                assert!(
                    operation
                        .groups
                        .lock()
                        .iter()
                        .all(|g| !g.is_empty() && g.len() <= group_size)
                );
            }
        }
    }
}

#[tokio::test]
async fn dry_run_skips_the_operation() {
    let operation = RecordingOperation::failing(&["item-3"]);
    let job = BatchJob::new(ListScanner::numbered(10), operation.clone(), 3);

    let summary = run_job(options(2).dry_run(true), job, &mut FixedAnswer(true))
        .await
        .unwrap();

    assert_eq!(operation.calls(), 0);
    assert_eq!(summary.success_count, 10);
    assert_eq!(summary.failure_count, 0);
}

#[tokio::test]
async fn declined_confirmation_touches_nothing() {
    let lister = CountingLister::default();
    let operation = RecordingOperation::default();
    let job = BatchJob::new(RemoteListingScanner::new(lister.clone()), operation.clone(), 1)
        .counter(lister.clone());
    let mut gate = ConfirmationGate::new(Cursor::new(b"no\n".to_vec()), Vec::new());

    let err = run_job(options(2), job, &mut gate).await.unwrap_err();

    assert_eq!(err.kind(), BatchErrorKind::Cancelled);
    assert_eq!(err.to_string(), "operation cancelled");
    assert_eq!(lister.count_calls.load(Ordering::SeqCst), 1);
    assert_eq!(lister.page_calls.load(Ordering::SeqCst), 0);
    assert_eq!(operation.calls(), 0);
}

#[tokio::test]
async fn force_bypasses_the_gate() {
    struct PanickingGate;
    impl Confirm for PanickingGate {
        fn confirm(&mut self, _message: &str) -> bool {
            panic!("gate must not be consulted with --force");
        }
    }

    let lister = CountingLister::default();
    let operation = RecordingOperation::default();
    let job = BatchJob::new(RemoteListingScanner::new(lister.clone()), operation.clone(), 1)
        .counter(lister);

    let summary = run_job(options(1).force(true), job, &mut PanickingGate)
        .await
        .unwrap();

    assert_eq!(summary.success_count, 2);
}

#[tokio::test]
async fn confirmation_message_includes_total() {
    struct Capture(Arc<Mutex<Option<String>>>);
    impl Confirm for Capture {
        fn confirm(&mut self, message: &str) -> bool {
            *self.0.lock() = Some(message.to_string());
            true
        }
    }

    let seen = Arc::new(Mutex::new(None));
    let lister = CountingLister::default();
    let job = BatchJob::new(
        RemoteListingScanner::new(lister.clone()),
        RecordingOperation::default(),
        1,
    )
    .counter(lister)
    .message(|total| format!("Deleting {} images", total.unwrap_or(0)));

    run_job(options(1), job, &mut Capture(Arc::clone(&seen)))
        .await
        .unwrap();

    assert_eq!(seen.lock().as_deref(), Some("Deleting 2 images"));
}

#[tokio::test]
async fn count_failure_aborts_before_scanning() {
    let lister = CountingLister {
        fail_count: true,
        ..CountingLister::default()
    };
    let operation = RecordingOperation::default();
    let job = BatchJob::new(RemoteListingScanner::new(lister.clone()), operation.clone(), 1)
        .counter(lister.clone());

    let err = run_job(options(2), job, &mut FixedAnswer(true))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), BatchErrorKind::Count);
    assert_eq!(lister.page_calls.load(Ordering::SeqCst), 0);
    assert_eq!(operation.calls(), 0);
}

#[tokio::test]
async fn scan_failure_is_reported_after_processing_found_items() {
    let operation = RecordingOperation::default();
    let mut scanner = ListScanner::new(["a", "b", "c"]);
    scanner.fail_after = true;
    let job = BatchJob::new(scanner, operation.clone(), 2);

    let err = run_job(options(2), job, &mut FixedAnswer(true))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), BatchErrorKind::Scan);
    assert!(err.to_string().contains("listing went away"));
    assert_eq!(operation.seen(), vec!["a", "b", "c"]);
    assert_eq!(
        err.partial_summary(),
        Some(&Summary {
            success_count: 3,
            failure_count: 0
        })
    );
}

#[tokio::test]
async fn partial_summary_counts_failures_before_a_scan_error() {
    let operation = RecordingOperation::failing(&["b"]);
    let mut scanner = ListScanner::new(["a", "b"]);
    scanner.fail_after = true;
    let job = BatchJob::new(scanner, operation, 1);

    let err = run_job(options(1), job, &mut FixedAnswer(true))
        .await
        .unwrap_err();

    let partial = err.partial_summary().unwrap();
    assert_eq!((partial.success_count, partial.failure_count), (1, 1));
}

#[tokio::test]
async fn declined_gate_has_no_partial_summary() {
    let job = BatchJob::new(ListScanner::new(["a"]), RecordingOperation::default(), 1);

    let err = run_job(options(1), job, &mut FixedAnswer(false))
        .await
        .unwrap_err();

    assert!(err.partial_summary().is_none());
}

/// Blocks inside `confirm` until another task on the runtime has run.
struct WaitsForRuntime {
    entered: std::sync::mpsc::Sender<()>,
    ran: Arc<AtomicBool>,
}

impl Confirm for WaitsForRuntime {
    fn confirm(&mut self, _message: &str) -> bool {
        self.entered.send(()).unwrap();
        for _ in 0..200 {
            if self.ran.load(Ordering::SeqCst) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn blocking_gate_leaves_the_worker_free() {
    let ran = Arc::new(AtomicBool::new(false));
    let (entered_tx, entered_rx) = std::sync::mpsc::channel();
    let mut gate = WaitsForRuntime {
        entered: entered_tx,
        ran: Arc::clone(&ran),
    };

    // The run occupies the only worker thread while the gate blocks.
    let run = tokio::spawn(async move {
        let job = BatchJob::new(ListScanner::new(["a"]), RecordingOperation::default(), 1);
        run_job(options(1), job, &mut gate).await
    });
    entered_rx.recv().unwrap();

    let flag = Arc::clone(&ran);
    tokio::spawn(async move { flag.store(true, Ordering::SeqCst) });

    let summary = run.await.unwrap().unwrap();
    assert_eq!(summary.success_count, 1);
}

#[tokio::test]
async fn group_errors_do_not_stop_workers() {
    let failing: Vec<String> = (0..20).map(|i| format!("item-{i}")).collect();
    let failing: Vec<&str> = failing.iter().map(String::as_str).collect();
    let operation = RecordingOperation::failing(&failing);
    let job = BatchJob::new(ListScanner::numbered(40), operation.clone(), 4);

    let summary = run_job(options(3), job, &mut FixedAnswer(true))
        .await
        .unwrap();

    assert_eq!(summary.success_count, 20);
    assert_eq!(summary.failure_count, 20);
    assert!(summary.has_failures());
}
