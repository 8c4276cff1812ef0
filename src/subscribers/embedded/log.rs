//! # LogWriter — events to `tracing`
//!
//! A subscriber that turns incoming [`Event`]s into structured `tracing` records
//! under the `queuevisor` target. Install any `tracing` subscriber (e.g.
//! `tracing_subscriber::fmt()`) to see them.
//!
//! ## Levels
//! - `error`: orphaned completion, grace exceeded, hook/subscriber panic
//! - `warn`: rejected submission, failed task, subscriber overflow
//! - `info`: manager lifecycle, limit changes
//! - `debug`: queue/execution flow
//! - `trace`: admission blocks (one per skipped task per pass)

use async_trait::async_trait;
use tracing::{debug, error, info, trace, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let key = e.restriction.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::OrphanedCompletion => {
                error!(target: "queuevisor", id = ?e.id, "completion for unknown task handle");
            }
            EventKind::GraceExceeded => {
                error!(target: "queuevisor", stuck = reason, "stop grace exceeded");
            }
            EventKind::HookPanicked | EventKind::SubscriberPanicked => {
                error!(target: "queuevisor", source = task, info = reason, "panic caught");
            }
            EventKind::TaskRejected => {
                warn!(target: "queuevisor", task, reason, "task rejected");
            }
            EventKind::TaskFailed => {
                warn!(target: "queuevisor", task, key, id = ?e.id, elapsed_ms = ?e.elapsed_ms, reason, "task failed");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "queuevisor", subscriber = task, reason, "subscriber dropped event");
            }
            EventKind::ManagerStarted => {
                info!(target: "queuevisor", generation = ?e.generation, max = ?e.limit, "queue manager started");
            }
            EventKind::StopRequested => {
                info!(target: "queuevisor", generation = ?e.generation, "stop requested");
            }
            EventKind::AllStoppedWithin => {
                info!(target: "queuevisor", "all tasks stopped within grace");
            }
            EventKind::ManagerStopped => {
                info!(target: "queuevisor", generation = ?e.generation, "queue manager stopped");
            }
            EventKind::LimitsChanged => {
                info!(target: "queuevisor", limit = reason, value = ?e.limit, "limit changed");
            }
            EventKind::TaskQueued => debug!(target: "queuevisor", task, "queued"),
            EventKind::TaskDuplicate => debug!(target: "queuevisor", task, "already queued"),
            EventKind::TaskRemovedFromQueue => debug!(target: "queuevisor", task, "removed from queue"),
            EventKind::TaskScheduled => {
                debug!(target: "queuevisor", task, key, id = ?e.id, "scheduled");
            }
            EventKind::TaskCompleted => {
                debug!(target: "queuevisor", task, key, id = ?e.id, elapsed_ms = ?e.elapsed_ms, "completed");
            }
            EventKind::TaskCanceled => {
                debug!(target: "queuevisor", task, key, id = ?e.id, "cancelled");
            }
            EventKind::TaskBlocked => {
                trace!(target: "queuevisor", task, key, limit = ?e.limit, "blocked by restriction");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
