//! # Queue manager configuration.
//!
//! Provides [`ManagerConfig`] centralized settings for one [`QueueManager`](crate::QueueManager).
//!
//! The two connection limits are only the **initial** values: both can be changed at
//! runtime with `set_max_connection_count` / `set_max_connection_count_per_host`.
//!
//! ## Sentinel values
//! - `stop_grace = 0s` → `stop()` does not wait for running tasks; they are reported
//!   as cancelled immediately
//! - `task_timeout = 0s` → no per-task timeout
//! - `completion_capacity`, `bus_capacity` → clamped to a minimum of 1

use std::time::Duration;

/// Configuration for the queue manager runtime.
///
/// ## Field semantics
/// - `max_connection_count`: global ceiling on executing tasks (`0` = nothing runs)
/// - `max_connection_count_per_host`: per-key ceiling for restrictions that declare none
/// - `stop_grace`: how long `stop()` waits for cancelled tasks to report back
/// - `task_timeout`: per-task execution timeout (`0s` = none)
/// - `completion_capacity`: size of the completion channel between workers and watcher
/// - `bus_capacity`: event bus ring buffer size
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Maximum number of tasks executing at once across all keys.
    pub max_connection_count: usize,

    /// Default maximum number of tasks executing at once per restriction key.
    ///
    /// Applies to every [`Restriction`](crate::Restriction) whose own
    /// `max_connection_count` is `0`.
    pub max_connection_count_per_host: usize,

    /// Maximum time `stop()` waits for in-flight tasks after cancelling them.
    ///
    /// Tasks still running afterwards are abandoned and reported to
    /// `completed_task` as cancelled.
    pub stop_grace: Duration,

    /// Per-task execution timeout.
    pub task_timeout: Duration,

    /// Capacity of the completion channel (completion-service queue).
    pub completion_capacity: usize,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,
}

impl ManagerConfig {
    /// Returns the per-task timeout as an `Option`.
    #[inline]
    pub fn task_timeout(&self) -> Option<Duration> {
        if self.task_timeout == Duration::ZERO {
            None
        } else {
            Some(self.task_timeout)
        }
    }

    #[inline]
    pub(crate) fn completion_capacity_clamped(&self) -> usize {
        self.completion_capacity.max(1)
    }

    #[inline]
    pub(crate) fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `max_connection_count = 4`
    /// - `max_connection_count_per_host = 1`
    /// - `stop_grace = 60s`
    /// - `task_timeout = 0s` (none)
    /// - `completion_capacity = 1024`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            max_connection_count: 4,
            max_connection_count_per_host: 1,
            stop_grace: Duration::from_secs(60),
            task_timeout: Duration::ZERO,
            completion_capacity: 1024,
            bus_capacity: 1024,
        }
    }
}
