use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Semaphore-bounded task pool with panic isolation and cooperative cancellation.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
    completed: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    skipped: Arc<AtomicUsize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl WorkerPool {
    pub fn new(concurrency: usize, cancel: CancellationToken) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            cancel,
            completed: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            skipped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Run `task_fn` over every item, at most `concurrency` at a time, and wait for all.
    ///
    /// Once the token is cancelled no new item is dispatched; tasks already running
    /// finish. A panicking task is counted as failed and yields no output.
    pub async fn run_all<T, F, Fut>(&self, items: Vec<T>, task_fn: F) -> Vec<Fut::Output>
    where
        F: Fn(T) -> Fut + Clone + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
        T: Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let total = items.len();

        for (dispatched, item) in items.into_iter().enumerate() {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = self.semaphore.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                self.skipped.fetch_add(total - dispatched, Ordering::Relaxed);
                tracing::debug!(skipped = total - dispatched, "pool stopped dispatching");
                break;
            };
            let task_fn = task_fn.clone();
            let completed = self.completed.clone();
            tasks.spawn(async move {
                let result = task_fn(item).await;
                completed.fetch_add(1, Ordering::Relaxed);
                drop(permit);
                result
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(output) => results.push(output),
                Err(e) => {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(error = %e, "worker task panicked");
                }
            }
        }
        results
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
