//! Error types used by the queue runtime and by queued tasks.
//!
//! This module defines two main error enums:
//!
//! - [`QueueError`] — errors raised by the queue manager and its executor pool.
//! - [`TaskError`] — errors raised by individual task executions.
//!
//! Neither type is ever returned from [`QueueManager::add_task_to_queue`](crate::QueueManager::add_task_to_queue),
//! [`init`](crate::QueueManager::init) or [`stop`](crate::QueueManager::stop): the manager
//! reports them through events and through the [`QueueHooks`](crate::QueueHooks) callbacks.
//! Both types provide `as_label` for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the queue runtime.
///
/// These represent failures of the orchestration machinery itself, e.g. a task that
/// could not be handed to the executor pool, or a shutdown that exceeded its grace period.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The executor pool is shut down (or shutting down) and refused the submission.
    #[error("executor pool is shut down")]
    PoolShutdown,

    /// Shutdown grace period was exceeded; some tasks were still running and were abandoned.
    #[error("stop grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Labels of the tasks that did not finish in time.
        stuck: Vec<String>,
    },
}

impl QueueError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use queuevisor::QueueError;
    ///
    /// assert_eq!(QueueError::PoolShutdown.as_label(), "queue_pool_shutdown");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            QueueError::PoolShutdown => "queue_pool_shutdown",
            QueueError::GraceExceeded { .. } => "queue_grace_exceeded",
        }
    }
}

/// # Errors produced by task execution.
///
/// Delivered to [`QueueHooks::completed_task`](crate::QueueHooks::completed_task) as the
/// outcome of a task that started but did not succeed.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution exceeded the configured per-task timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error (a panic inside the task ends up here too).
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task execution failed but may succeed if queued again.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled (`cancel_tasks(true)` or `stop()`).
    #[error("task cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use queuevisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "task cancelled".to_string(),
        }
    }

    /// Indicates whether re-queueing the task could reasonably succeed.
    ///
    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`].
    ///
    /// # Example
    /// ```
    /// use queuevisor::TaskError;
    ///
    /// assert!(TaskError::fail("reset by peer").is_retryable());
    /// assert!(!TaskError::fatal("bad url").is_retryable());
    /// assert!(!TaskError::Canceled.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(QueueError::PoolShutdown.as_label(), "queue_pool_shutdown");
        let grace = QueueError::GraceExceeded {
            grace: Duration::from_secs(1),
            stuck: vec!["a".into()],
        };
        assert_eq!(grace.as_label(), "queue_grace_exceeded");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
        assert_eq!(TaskError::fatal("x").as_label(), "task_fatal");
    }

    #[test]
    fn display_includes_details() {
        let err = TaskError::fail("connection refused");
        assert_eq!(err.to_string(), "execution failed: connection refused");
        assert_eq!(err.as_message(), "error: connection refused");
    }
}
