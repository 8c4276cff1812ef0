//! # Function-backed task factory (`QueueTaskFn`)
//!
//! [`QueueTaskFn`] wraps a closure `F: Fn(T, CancellationToken) -> Fut` and acts as a
//! [`QueueTaskFactory`]: every admitted task gets a fresh queue task that calls the
//! closure with its own clone of the task value.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use queuevisor::{QueueTaskFactory, QueueTaskFn, TaskError};
//!
//! let factory: Arc<dyn QueueTaskFactory<u32, u32>> =
//!     QueueTaskFn::arc(|n: u32, _ctx: CancellationToken| async move {
//!         Ok::<_, TaskError>(n * 2)
//!     });
//!
//! let unit = factory.create_task_callable(&21);
//! assert_eq!(*unit.task(), 21);
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{QueueItem, QueueTask, QueueTaskFactory, QueueTaskRef};

/// Closure-backed [`QueueTaskFactory`].
#[derive(Debug)]
pub struct QueueTaskFn<F> {
    f: Arc<F>,
}

impl<F> QueueTaskFn<F> {
    /// Creates a new function-backed factory.
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Creates the factory and returns it behind an `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

/// Queue task produced by [`QueueTaskFn`].
struct FnTask<T, F> {
    task: T,
    f: Arc<F>,
}

#[async_trait]
impl<T, R, F, Fut> QueueTask<T, R> for FnTask<T, F>
where
    T: QueueItem,
    R: Send + 'static,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
{
    fn task(&self) -> &T {
        &self.task
    }

    async fn call(&self, ctx: CancellationToken) -> Result<R, TaskError> {
        (self.f)(self.task.clone(), ctx).await
    }
}

impl<T, R, F, Fut> QueueTaskFactory<T, R> for QueueTaskFn<F>
where
    T: QueueItem,
    R: Send + 'static,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
{
    fn create_task_callable(&self, task: &T) -> QueueTaskRef<T, R> {
        Arc::new(FnTask {
            task: task.clone(),
            f: Arc::clone(&self.f),
        })
    }
}
