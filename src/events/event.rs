//! # Runtime events emitted by the queue manager.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: manager start/stop and shutdown outcome
//! - **Queue events**: enqueue, duplicate, removal, admission block
//! - **Execution events**: scheduled, completed, failed, cancelled, rejected
//! - **Internal events**: subscriber overflow/panic, hook panic, orphaned completion
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task label,
//! restriction key, limits and elapsed time.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use queuevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskBlocked)
//!     .with_task("Download(42)")
//!     .with_restriction("example.com")
//!     .with_limit(2);
//!
//! assert_eq!(ev.kind, EventKind::TaskBlocked);
//! assert_eq!(ev.restriction.as_deref(), Some("example.com"));
//! assert_eq!(ev.limit, Some(2));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Lifecycle events ===
    /// Scheduler and completion watcher were started by `init()`.
    ///
    /// Sets:
    /// - `generation`: loop generation (fresh on every `init()`)
    /// - `limit`: global connection ceiling
    ManagerStarted,

    /// `stop()` was called on a running manager.
    ///
    /// Sets:
    /// - `generation`: loop generation being stopped
    StopRequested,

    /// All in-flight tasks were reaped within the stop grace period.
    AllStoppedWithin,

    /// Stop grace period exceeded; remaining tasks were abandoned as cancelled.
    ///
    /// Sets:
    /// - `reason`: labels of the stuck tasks
    GraceExceeded,

    /// `stop()` finished; loops joined and bookkeeping drained.
    ///
    /// Sets:
    /// - `generation`: loop generation that stopped
    ManagerStopped,

    /// Global or per-host connection limit changed.
    ///
    /// Sets:
    /// - `limit`: new value
    /// - `reason`: `"max_connection_count"` or `"max_connection_count_per_host"`
    LimitsChanged,

    // === Queue events ===
    /// Task appended to the pending queue.
    ///
    /// Sets:
    /// - `task`: task label
    TaskQueued,

    /// Task was not appended because an equal task is already queued or executing.
    ///
    /// Sets:
    /// - `task`: task label
    TaskDuplicate,

    /// Task skipped during a scheduling pass because its restriction is saturated.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `restriction`: restriction key
    /// - `limit`: effective per-key ceiling
    TaskBlocked,

    /// Task left the queue without running (`cancel_tasks` / `remove_task_from_queue`).
    ///
    /// Sets:
    /// - `task`: task label
    TaskRemovedFromQueue,

    // === Execution events ===
    /// Task promoted from the queue and handed to the executor pool.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `restriction`: restriction key
    /// - `id`: in-flight handle id
    TaskScheduled,

    /// Task could not be submitted to the executor pool.
    ///
    /// Sets:
    /// - `task`: task label
    /// - `reason`: rejection reason
    TaskRejected,

    /// Task finished successfully.
    ///
    /// Sets:
    /// - `task`, `restriction`, `id`
    /// - `elapsed_ms`: run time
    TaskCompleted,

    /// Task finished with an error (including timeout and panic).
    ///
    /// Sets:
    /// - `task`, `restriction`, `id`
    /// - `reason`: error message
    /// - `elapsed_ms`: run time
    TaskFailed,

    /// Task was cancelled after having started.
    ///
    /// Sets:
    /// - `task`, `restriction`, `id`
    TaskCanceled,

    // === Internal events ===
    /// A completion arrived for a handle that is not in the executing set.
    ///
    /// Indicates a bookkeeping bug; the watcher keeps running.
    ///
    /// Sets:
    /// - `id`: orphaned handle id
    OrphanedCompletion,

    /// A caller hook panicked; the manager caught it and carried on.
    ///
    /// Sets:
    /// - `task`: hook name
    /// - `reason`: panic info/message
    HookPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task label (debug rendering of the task), or subscriber/hook name.
    pub task: Option<Arc<str>>,
    /// Restriction key the task was admitted under.
    pub restriction: Option<Arc<str>>,
    /// In-flight handle id.
    pub id: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// A limit value (global ceiling, per-key ceiling).
    pub limit: Option<usize>,
    /// Time the task spent in the executor, in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Loop generation (incremented by each `init()`).
    pub generation: Option<u64>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            restriction: None,
            id: None,
            reason: None,
            limit: None,
            elapsed_ms: None,
            generation: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task label.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a restriction key.
    #[inline]
    pub fn with_restriction(mut self, key: impl Into<Arc<str>>) -> Self {
        self.restriction = Some(key.into());
        self
    }

    /// Attaches an in-flight handle id.
    #[inline]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Attaches a limit value.
    #[inline]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Attaches an elapsed duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Attaches a loop generation.
    #[inline]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = Some(generation);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// Returns `true` for events that indicate a bug or a lost shutdown race.
    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(
            self.kind,
            EventKind::OrphanedCompletion
                | EventKind::GraceExceeded
                | EventKind::HookPanicked
                | EventKind::SubscriberPanicked
        )
    }
}
