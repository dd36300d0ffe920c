// ABOUTME: Drives one batch run end to end: count, confirm, scan, process, tally.
// ABOUTME: The drain loop on the calling task owns the counters and the progress bar.

use super::confirm::Confirm;
use super::error::{BatchError, ScanError};
use super::options::BatchOptions;
use super::outcome::Summary;
use super::progress::BatchProgress;
use super::scanner::{Counter, Scanner};
use super::worker::{Operation, start_workers};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};

type MessageFn = Box<dyn Fn(Option<u64>) -> String + Send + Sync>;

/// The collaborators of one batch command.
pub struct BatchJob<C> {
    scanner: Arc<dyn Scanner<C>>,
    operation: Arc<dyn Operation<C>>,
    counter: Option<Arc<dyn Counter<C>>>,
    group_size: usize,
    message: MessageFn,
}

impl<C: Send + Sync + 'static> BatchJob<C> {
    pub fn new(
        scanner: impl Scanner<C> + 'static,
        operation: impl Operation<C> + 'static,
        group_size: usize,
    ) -> Self {
        Self {
            scanner: Arc::new(scanner),
            operation: Arc::new(operation),
            counter: None,
            group_size,
            message: Box::new(|total| match total {
                Some(total) => format!("Processing {total} items"),
                None => "Processing items".to_string(),
            }),
        }
    }

    /// Pre-count items for the progress bar and the confirmation message.
    pub fn counter(mut self, counter: impl Counter<C> + 'static) -> Self {
        self.counter = Some(Arc::new(counter));
        self
    }

    /// Pending-action message shown before the run. Receives the expected
    /// total when a counter is set.
    pub fn message(mut self, message: impl Fn(Option<u64>) -> String + Send + Sync + 'static) -> Self {
        self.message = Box::new(message);
        self
    }

    pub fn group_size(&self) -> usize {
        self.group_size
    }
}

/// Ask the gate without stalling a runtime worker. The gate usually blocks
/// on stdin.
fn confirm_off_runtime(gate: &mut dyn Confirm, message: &str) -> bool {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(|| gate.confirm(message))
        }
        // block_in_place panics on a current-thread runtime.
        _ => gate.confirm(message),
    }
}

/// Run a batch job.
///
/// Group failures are counted in the summary. Only a failed count, a declined
/// confirmation or a failed scan turns into an error, and a failed scan is
/// reported only after every item it had already produced was processed.
pub async fn run<C>(
    client: Arc<C>,
    options: BatchOptions,
    job: BatchJob<C>,
    gate: &mut dyn Confirm,
) -> Result<Summary, BatchError>
where
    C: Send + Sync + 'static,
{
    let total = match &job.counter {
        Some(counter) => Some(counter.count(&client).await.map_err(BatchError::Count)?),
        None => None,
    };

    let message = (job.message)(total);
    if options.force {
        tracing::info!("{}", message);
    } else if !confirm_off_runtime(gate, &message) {
        return Err(BatchError::Cancelled);
    }

    let options = Arc::new(options);
    let (item_tx, item_rx) = flume::bounded(0);
    let (result_tx, result_rx) = flume::bounded(0);

    let pool = start_workers(
        Arc::clone(&options),
        Arc::clone(&client),
        item_rx,
        result_tx,
        job.operation,
        job.group_size,
    );

    let scanner = job.scanner;
    let scan_client = Arc::clone(&client);
    let scan = tokio::spawn(async move { scanner.scan(&scan_client, item_tx).await });

    let progress = BatchProgress::new(total, options.no_progress);
    let mut summary = Summary::default();

    while let Ok(outcome) = result_rx.recv_async().await {
        summary.add(&outcome);
        progress.advance(outcome.processed() as u64);

        if let Some(e) = &outcome.error {
            tracing::warn!("error processing group: {}", e);
        }
    }
    progress.finish();
    pool.join().await;

    let scan_error = match scan.await {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(e) => Some(ScanError::Aborted(e.to_string())),
    };
    if let Some(source) = scan_error {
        return Err(BatchError::Scan { source, summary });
    }

    tracing::debug!(
        "batch finished: {} succeeded, {} failed",
        summary.success_count,
        summary.failure_count
    );
    Ok(summary)
}
