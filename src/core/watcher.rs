//! # Completion watcher: reaps finished tasks.
//!
//! ```text
//! loop {
//!   select! {
//!     token cancelled           ─► exit, hand the receiver back to stop()
//!     rx.recv() == None         ─► exit (pool terminated)
//!     rx.recv() == Some(done)   ─► reap(done)
//!   }
//! }
//!
//! reap(done):
//!   executing.remove(done.id) ── missing ─► OrphanedCompletion, keep going
//!   counters[key] -= 1 (floor 0), dirty = true
//!   TaskCompleted | TaskFailed | TaskCanceled
//!   hooks.completed_task(..)    (lock released)
//!   wakeup.notify_one()
//! ```

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::lock;
use super::manager::{QueueManager, label};
use super::pool::Completion;
use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::tasks::QueueItem;

/// Watcher loop of one generation; returns the receiver so `stop()` can keep draining.
pub(super) async fn run<T: QueueItem, R: Send + 'static>(
    mgr: Arc<QueueManager<T, R>>,
    mut rx: mpsc::Receiver<Completion<R>>,
    token: CancellationToken,
) -> mpsc::Receiver<Completion<R>> {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(done) => mgr.reap(done),
                None => break,
            },
        }
    }
    rx
}

impl<T: QueueItem, R: Send + 'static> QueueManager<T, R> {
    /// Books one completion and hands it to `completed_task`.
    pub(super) fn reap(&self, done: Completion<R>) {
        let Completion {
            id,
            outcome,
            elapsed,
        } = done;

        let entry = {
            let mut guard = lock(&self.state);
            let st = &mut *guard;
            let entry = st.executing.remove(&id);
            if let Some(f) = &entry {
                st.counters.decrement(&f.restriction);
                st.check_schedule_tasks = true;
            }
            entry
        };
        let Some(entry) = entry else {
            self.bus
                .publish(Event::new(EventKind::OrphanedCompletion).with_id(id));
            return;
        };

        let ev = match &outcome {
            Ok(_) => Event::new(EventKind::TaskCompleted),
            Err(TaskError::Canceled) => Event::new(EventKind::TaskCanceled),
            Err(err) => Event::new(EventKind::TaskFailed).with_reason(err.to_string()),
        };
        self.bus.publish(
            ev.with_task(label(&entry.task))
                .with_restriction(Arc::clone(&entry.restriction))
                .with_id(id)
                .with_elapsed(elapsed),
        );

        self.notify_completed(entry.complete(outcome, elapsed));
        self.wakeup.notify_one();
    }

    /// Reaps every completion already delivered, without waiting.
    pub(super) fn remove_task_callables(&self, rx: &mut mpsc::Receiver<Completion<R>>) {
        while let Ok(done) = rx.try_recv() {
            self.reap(done);
        }
    }
}
