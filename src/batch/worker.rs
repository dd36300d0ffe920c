// ABOUTME: Fixed-size worker pool draining the item channel in groups.
// ABOUTME: A waiter task joins every worker before releasing the results channel.

use super::options::BatchOptions;
use super::outcome::OperationOutcome;
use crate::types::WorkItem;
use async_trait::async_trait;
use flume::{Receiver, Sender};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Performs the remote side effect for one group of work items.
///
/// Failures belong in the returned outcome. They never stop the worker.
#[async_trait]
pub trait Operation<C: Send + Sync>: Send + Sync {
    async fn apply(&self, client: &C, items: &[WorkItem], options: &BatchOptions)
    -> OperationOutcome;
}

/// Handle on a running worker pool.
///
/// The results channel closes once every worker has finished and the pool's
/// own sender has been dropped.
pub struct WorkerPool {
    waiter: JoinHandle<()>,
}

impl WorkerPool {
    /// Wait for every worker to exit.
    pub async fn join(self) {
        if let Err(e) = self.waiter.await {
            tracing::error!("worker pool waiter failed: {}", e);
        }
    }
}

/// Spawn `options.concurrency` workers.
///
/// Each worker reads items until the channel closes, flushing a group every
/// `group_size` items plus one final partial group. A `group_size` of 0 is
/// treated as 1.
pub fn start_workers<C, O>(
    options: Arc<BatchOptions>,
    client: Arc<C>,
    items: Receiver<WorkItem>,
    results: Sender<OperationOutcome>,
    operation: Arc<O>,
    group_size: usize,
) -> WorkerPool
where
    C: Send + Sync + 'static,
    O: Operation<C> + ?Sized + 'static,
{
    let group_size = group_size.max(1);
    let concurrency = options.concurrency.get();
    tracing::debug!(
        "starting {} worker(s), group size {}",
        concurrency,
        group_size
    );

    let workers: Vec<_> = (0..concurrency)
        .map(|id| {
            let worker = Worker {
                id,
                options: Arc::clone(&options),
                client: Arc::clone(&client),
                items: items.clone(),
                results: results.clone(),
                operation: Arc::clone(&operation),
                group_size,
            };
            tokio::spawn(worker.run())
        })
        .collect();

    // The original sender moves into the waiter, so the channel cannot close
    // before every worker has been joined.
    let waiter = tokio::spawn(async move {
        for (id, result) in futures::future::join_all(workers)
            .await
            .into_iter()
            .enumerate()
        {
            if let Err(e) = result {
                tracing::error!("worker {} terminated abnormally: {}", id, e);
            }
        }
        drop(results);
    });

    WorkerPool { waiter }
}

struct Worker<C, O: ?Sized> {
    id: usize,
    options: Arc<BatchOptions>,
    client: Arc<C>,
    items: Receiver<WorkItem>,
    results: Sender<OperationOutcome>,
    operation: Arc<O>,
    group_size: usize,
}

impl<C, O> Worker<C, O>
where
    C: Send + Sync,
    O: Operation<C> + ?Sized,
{
    async fn run(self) {
        let mut group = Vec::with_capacity(self.group_size);

        while let Ok(item) = self.items.recv_async().await {
            group.push(item);
            if group.len() >= self.group_size && !self.flush(&mut group).await {
                return;
            }
        }

        if !group.is_empty() {
            self.flush(&mut group).await;
        }
        tracing::trace!("worker {} done", self.id);
    }

    /// Process and clear the current group. Returns false when nobody is
    /// listening for outcomes any more.
    async fn flush(&self, group: &mut Vec<WorkItem>) -> bool {
        let outcome = if self.options.dry_run {
            OperationOutcome::succeeded(group.len())
        } else {
            self.operation
                .apply(&self.client, group.as_slice(), &self.options)
                .await
        };
        group.clear();

        if self.results.send_async(outcome).await.is_err() {
            tracing::warn!("worker {} stopping: results channel closed", self.id);
            return false;
        }
        true
    }
}
