//! # Queue task abstraction.
//!
//! A caller enqueues plain values ([`QueueItem`]s). When the scheduler admits one,
//! the [`QueueTaskFactory`] turns it into a [`QueueTask`]: the executable unit the
//! executor pool runs. The common handle type is [`QueueTaskRef`], an
//! `Arc<dyn QueueTask<T, R>>` shared between the executing set and the pool worker.
//!
//! A queue task receives a [`CancellationToken`]. The pool also drops the running
//! future once the token fires, so tasks only need to check it around blocking
//! sections that never yield.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Bounds required from queued values.
///
/// Equality drives duplicate detection; `Debug` provides the label used in events.
/// Implemented automatically for every matching type.
pub trait QueueItem: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> QueueItem for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

/// # Executable unit bound to one admitted task.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use queuevisor::{QueueTask, TaskError};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Fetch { url: String }
///
/// struct FetchCall(Fetch);
///
/// #[async_trait]
/// impl QueueTask<Fetch, u64> for FetchCall {
///     fn task(&self) -> &Fetch { &self.0 }
///
///     async fn call(&self, ctx: CancellationToken) -> Result<u64, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // download self.0.url ...
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait QueueTask<T, R>: Send + Sync + 'static {
    /// Returns the task this unit executes.
    fn task(&self) -> &T;

    /// Runs the task once.
    async fn call(&self, ctx: CancellationToken) -> Result<R, TaskError>;
}

/// Shared handle to a queue task.
pub type QueueTaskRef<T, R> = Arc<dyn QueueTask<T, R>>;

/// Builds the executable unit for an admitted task.
///
/// Called by the scheduler while it holds the manager lock: implementations must be
/// quick and must not call back into the manager.
pub trait QueueTaskFactory<T, R>: Send + Sync + 'static {
    /// Creates the queue task for `task`.
    fn create_task_callable(&self, task: &T) -> QueueTaskRef<T, R>;
}
