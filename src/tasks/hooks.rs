//! # Caller hooks and completion records.
//!
//! [`QueueHooks`] is the capability the surrounding application injects into the
//! manager: it resolves a task's [`Restriction`] and is told when a task leaves the
//! queue without running or when a started task finishes.
//!
//! ## Call sites
//! ```text
//! scheduler pass (lock held)   ──► restriction_for_task(&task)
//! cancel_tasks / remove_task   ──► removed_task_from_queue(task, false)
//! pool refused the submission  ──► removed_task_from_queue(task, true)
//! completion watcher / stop()  ──► completed_task(Completed { .. })
//! ```
//!
//! `removed_task_from_queue` and `completed_task` run **without** the manager lock and
//! may call back into the manager (e.g. re-queue a failed task). A panic inside a hook
//! is caught and published as `EventKind::HookPanicked`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::restrictions::Restriction;
use crate::tasks::task::QueueTaskRef;

/// Application callbacks driven by the queue manager.
pub trait QueueHooks<T, R>: Send + Sync + 'static {
    /// Resolves the admission policy for `task`.
    ///
    /// Called under the manager lock on every scheduling pass; keep it cheap and do
    /// not call back into the manager.
    fn restriction_for_task(&self, task: &T) -> Restriction;

    /// A task left the queue without running.
    ///
    /// `execute_failure` is `true` when the executor pool refused it, `false` when it
    /// was cancelled or removed by the caller.
    fn removed_task_from_queue(&self, task: T, execute_failure: bool);

    /// A started task finished, failed or was cancelled. Called exactly once per
    /// started task.
    fn completed_task(&self, completed: Completed<T, R>);
}

/// Identity and cancellation handle of an in-flight task.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    id: u64,
    token: CancellationToken,
}

impl TaskHandle {
    pub(crate) fn new(id: u64, token: CancellationToken) -> Self {
        Self { id, token }
    }

    /// Unique id of this execution (never reused within a process).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Requests cancellation of the execution.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Record handed to [`QueueHooks::completed_task`].
pub struct Completed<T, R> {
    pub(crate) task: T,
    pub(crate) queue_task: QueueTaskRef<T, R>,
    pub(crate) handle: TaskHandle,
    pub(crate) restriction: Arc<str>,
    pub(crate) outcome: Result<R, TaskError>,
    pub(crate) elapsed: Duration,
}

impl<T, R> Completed<T, R> {
    /// The task that ran.
    pub fn task(&self) -> &T {
        &self.task
    }

    /// The queue task created for it by the factory.
    pub fn queue_task(&self) -> &QueueTaskRef<T, R> {
        &self.queue_task
    }

    /// The in-flight handle the task ran under.
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    /// Restriction key the task was admitted under.
    pub fn restriction_key(&self) -> &str {
        &self.restriction
    }

    /// Result of the execution.
    pub fn outcome(&self) -> &Result<R, TaskError> {
        &self.outcome
    }

    /// Time spent inside the executor pool (zero if it never got a worker slot).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `true` if the task finished successfully.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// `true` if the task was cancelled after having started.
    pub fn is_canceled(&self) -> bool {
        matches!(self.outcome, Err(TaskError::Canceled))
    }

    /// Splits the record into the task and its outcome.
    pub fn into_parts(self) -> (T, Result<R, TaskError>) {
        (self.task, self.outcome)
    }
}
