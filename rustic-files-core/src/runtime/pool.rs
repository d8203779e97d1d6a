use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{Error, Result};

/// Bounded pool for blocking filesystem work.
///
/// Jobs run on tokio's blocking threads; the semaphore caps how many run at
/// once. Jobs are not cancellable once started and no ordering is promised
/// between jobs submitted concurrently.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn run<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| Error::Tool("worker pool is closed".to_owned()))?;

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        });

        handle
            .await
            .map_err(|err| Error::Tool(format!("worker task join failed: {err}")))?
    }
}
