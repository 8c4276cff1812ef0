//! # Executor pool: bounded, resizable execution of admitted tasks.
//!
//! Each submission spawns a tokio task that first waits for a worker permit, runs one
//! [`QueueTask`](crate::QueueTask) and pushes a [`Completion`] into the completion
//! channel (the completion-service queue drained by the watcher).
//!
//! ```text
//! submit(id, unit) ──► spawn ──► acquire permit ──► run_once() ──► release permit
//!        │                                                              │
//!        └─► TaskHandle { id, token }          completion channel ◄─────┘
//! ```
//!
//! ## Rules
//! - Permits = capacity, clamped to `Semaphore::MAX_PERMITS` so that `usize::MAX`
//!   can stand for "unlimited". Growing adds permits; shrinking forgets idle permits and
//!   records the rest as **debt**, paid back by forgetting permits as running tasks
//!   release them. Running tasks are never interrupted by a shrink.
//! - Every job token is a child of the pool token: `shutdown_now()` cancels them all.
//! - The pool holds one completion sender; every job holds a clone. After
//!   `shutdown_now()` the channel closes exactly when the last job has reported, so the
//!   receiver observing `None` means the pool has terminated.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use super::{lock, worker};
use crate::error::{QueueError, TaskError};
use crate::tasks::{QueueItem, QueueTaskRef, TaskHandle};

/// Result of one execution, sent from the job to the completion watcher.
pub(crate) struct Completion<R> {
    pub id: u64,
    pub outcome: Result<R, TaskError>,
    pub elapsed: Duration,
}

#[derive(Debug)]
struct Sizing {
    capacity: usize,
    debt: usize,
}

pub(crate) struct ExecutorPool<R> {
    pub(super) permits: Arc<Semaphore>,
    sizing: Mutex<Sizing>,
    completions: Mutex<Option<mpsc::Sender<Completion<R>>>>,
    shutdown: CancellationToken,
    pub(super) task_timeout: Option<Duration>,
}

impl<R: Send + 'static> ExecutorPool<R> {
    pub fn new(
        capacity: usize,
        completions: mpsc::Sender<Completion<R>>,
        task_timeout: Option<Duration>,
    ) -> Arc<Self> {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        Arc::new(Self {
            permits: Arc::new(Semaphore::new(capacity)),
            sizing: Mutex::new(Sizing { capacity, debt: 0 }),
            completions: Mutex::new(Some(completions)),
            shutdown: CancellationToken::new(),
            task_timeout,
        })
    }

    /// Resizes the pool; takes effect for the next permit acquisition.
    pub fn set_capacity(&self, capacity: usize) {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        let mut s = lock(&self.sizing);
        if capacity > s.capacity {
            let mut grow = capacity - s.capacity;
            let repay = grow.min(s.debt);
            s.debt -= repay;
            grow -= repay;
            if grow > 0 {
                self.permits.add_permits(grow);
            }
        } else if capacity < s.capacity {
            let shrink = s.capacity - capacity;
            let forgotten = self.permits.forget_permits(shrink);
            s.debt += shrink - forgotten;
        }
        s.capacity = capacity;
    }

    /// Hands a permit back, or forgets it while a shrink is still outstanding.
    pub(super) fn release(&self, permit: OwnedSemaphorePermit) {
        let mut s = lock(&self.sizing);
        if s.debt > 0 {
            s.debt -= 1;
            permit.forget();
        }
    }

    /// Spawns the job for `unit`.
    ///
    /// Fails with [`QueueError::PoolShutdown`] once `shutdown_now()` was called.
    pub fn submit<T: QueueItem>(
        self: &Arc<Self>,
        id: u64,
        unit: QueueTaskRef<T, R>,
    ) -> Result<TaskHandle, QueueError> {
        if self.shutdown.is_cancelled() {
            return Err(QueueError::PoolShutdown);
        }
        let tx = lock(&self.completions)
            .as_ref()
            .cloned()
            .ok_or(QueueError::PoolShutdown)?;

        let token = self.shutdown.child_token();
        let handle = TaskHandle::new(id, token.clone());
        let pool = Arc::clone(self);

        tokio::spawn(async move {
            let (outcome, elapsed) = worker::execute(&pool, unit, token).await;
            drop(pool);
            let _ = tx.send(Completion { id, outcome, elapsed }).await;
        });
        Ok(handle)
    }

    /// Cancels every job, refuses new submissions and releases the pool's own sender.
    pub fn shutdown_now(&self) {
        self.shutdown.cancel();
        self.permits.close();
        lock(&self.completions).take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::QueueTaskFn;
    use crate::tasks::QueueTaskFactory;
    use tokio::sync::Notify;

    fn doubled(n: u32) -> QueueTaskRef<u32, u32> {
        QueueTaskFn::new(|n: u32, _ctx: CancellationToken| {
            futures::future::ready(Ok::<u32, TaskError>(n * 2))
        })
        .create_task_callable(&n)
    }

    #[tokio::test]
    async fn completion_is_delivered() {
        let (tx, mut rx) = mpsc::channel(4);
        let pool = ExecutorPool::new(1, tx, None);
        let unit = doubled(21);

        let handle = pool.submit(7, unit).expect("submit");
        assert_eq!(handle.id(), 7);

        let done = rx.recv().await.expect("completion");
        assert_eq!(done.id, 7);
        assert_eq!(done.outcome, Ok(42));
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let (tx, mut rx) = mpsc::channel(4);
        let pool = ExecutorPool::new(1, tx, None);
        pool.shutdown_now();

        let unit = doubled(1);
        assert_eq!(pool.submit(1, unit).err(), Some(QueueError::PoolShutdown));
        // pool's sender is gone and no job holds one: channel is closed
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancelled_job_reports_canceled() {
        let (tx, mut rx) = mpsc::channel(4);
        let pool = ExecutorPool::new(1, tx, None);
        let gate = Arc::new(Notify::new());
        let g = Arc::clone(&gate);
        let factory = QueueTaskFn::arc(move |_n: u32, _ctx: CancellationToken| {
            let g = Arc::clone(&g);
            async move {
                g.notified().await;
                Ok::<u32, TaskError>(0)
            }
        });

        let handle = pool.submit(3, factory.create_task_callable(&0)).expect("submit");
        handle.cancel();

        let done = rx.recv().await.expect("completion");
        assert_eq!(done.id, 3);
        assert_eq!(done.outcome, Err(TaskError::Canceled));
    }

    #[tokio::test]
    async fn shrink_below_running_is_paid_back_on_release() {
        let (tx, _rx) = mpsc::channel::<Completion<u32>>(1);
        let pool = ExecutorPool::new(2, tx, None);
        let a = Arc::clone(&pool.permits).acquire_owned().await.expect("permit");
        let b = Arc::clone(&pool.permits).acquire_owned().await.expect("permit");

        pool.set_capacity(1);
        assert_eq!(lock(&pool.sizing).capacity, 1);
        assert_eq!(pool.permits.available_permits(), 0);

        pool.release(a);
        assert_eq!(pool.permits.available_permits(), 0);
        pool.release(b);
        assert_eq!(pool.permits.available_permits(), 1);
    }

    #[tokio::test]
    async fn grow_repays_debt_first() {
        let (tx, _rx) = mpsc::channel::<Completion<u32>>(1);
        let pool = ExecutorPool::new(2, tx, None);
        let a = Arc::clone(&pool.permits).acquire_owned().await.expect("permit");
        let b = Arc::clone(&pool.permits).acquire_owned().await.expect("permit");

        pool.set_capacity(0);
        pool.set_capacity(3);
        assert_eq!(pool.permits.available_permits(), 1);

        pool.release(a);
        pool.release(b);
        assert_eq!(pool.permits.available_permits(), 3);
    }

    #[tokio::test]
    async fn unlimited_capacity_is_clamped() {
        let (tx, _rx) = mpsc::channel::<Completion<u32>>(1);
        let pool = ExecutorPool::new(usize::MAX, tx, None);
        assert_eq!(pool.permits.available_permits(), Semaphore::MAX_PERMITS);

        pool.set_capacity(2);
        assert_eq!(pool.permits.available_permits(), 2);

        pool.set_capacity(usize::MAX);
        assert_eq!(pool.permits.available_permits(), Semaphore::MAX_PERMITS);
        assert_eq!(lock(&pool.sizing).capacity, Semaphore::MAX_PERMITS);
    }
}
