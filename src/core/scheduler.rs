//! # Scheduler: promotes queued tasks into the executor pool.
//!
//! ```text
//! loop {
//!   schedule_pass()
//!     ├─ stop                                   ─► exit
//!     ├─ !dirty || queue empty || executing==max ─► wait for wakeup
//!     └─ scan queue in order:
//!          ├─ executing == max                  ─► end of scan
//!          ├─ counters[key] >= effective_max    ─► keep queued, next
//!          │     (TaskBlocked once, when the key starts blocking)
//!          └─ admit: remove, counters[key] += 1, factory, pool.submit
//!                ├─ Ok  ─► executing.insert(id), TaskScheduled
//!                └─ Err ─► counters[key] -= 1, TaskRejected,
//!                          removed_task_from_queue(task, true) after unlock
//!        dirty = false
//! }
//! ```
//!
//! Tasks skipped for their key are not re-checked within the same pass; the next
//! pass is triggered by a completion, an enqueue or a raised limit.
//!
//! `TaskBlocked` is published for the first skipped task of a key that was not
//! blocked in the previous scan, so a long queue behind one key costs one event
//! per blocking episode rather than one per queued task and pass.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use super::lock;
use super::manager::{QueueManager, label};
use super::state::InFlight;
use crate::events::{Event, EventKind};
use crate::tasks::QueueItem;

pub(super) enum Pass {
    /// Stop flag observed.
    Exit,
    /// Nothing to do until the next wakeup.
    Idle,
    /// One scan completed.
    Scanned,
}

/// Scheduler loop of one generation. Exits once the stop flag is observed.
pub(super) async fn run<T: QueueItem, R: Send + 'static>(mgr: Arc<QueueManager<T, R>>) {
    loop {
        match mgr.schedule_pass() {
            Pass::Exit => break,
            Pass::Idle => mgr.wakeup.notified().await,
            Pass::Scanned => {}
        }
    }
}

impl<T: QueueItem, R: Send + 'static> QueueManager<T, R> {
    /// Runs one admission pass over the queue.
    pub(super) fn schedule_pass(&self) -> Pass {
        let mut rejected = Vec::new();
        {
            let mut guard = lock(&self.state);
            let st = &mut *guard;
            if st.stop {
                return Pass::Exit;
            }
            if !st.wants_pass() {
                if st.queue.is_empty() {
                    st.blocked.clear();
                }
                return Pass::Idle;
            }
            let Some(pool) = st.pool.clone() else {
                return Pass::Idle;
            };

            let mut blocked = HashSet::new();
            let mut scanned_all = true;
            let mut i = 0;
            while i < st.queue.len() {
                if st.executing.len() >= st.max_connection_count {
                    scanned_all = false;
                    break;
                }

                let lookup = self.guard_hook("restriction_for_task", || {
                    self.hooks.restriction_for_task(&st.queue[i])
                });
                let Some(restriction) = lookup else {
                    if let Some(task) = st.queue.remove(i) {
                        self.bus.publish(
                            Event::new(EventKind::TaskRejected)
                                .with_task(label(&task))
                                .with_reason("restriction lookup panicked"),
                        );
                        rejected.push(task);
                    }
                    continue;
                };

                let key = Arc::clone(restriction.key_arc());
                let limit = restriction.effective_max(st.max_connection_count_per_host);
                if st.counters.current(&key) >= limit {
                    if !st.blocked.contains(&key) && blocked.insert(Arc::clone(&key)) {
                        self.bus.publish(
                            Event::new(EventKind::TaskBlocked)
                                .with_task(label(&st.queue[i]))
                                .with_restriction(key)
                                .with_limit(limit),
                        );
                    } else {
                        blocked.insert(key);
                    }
                    i += 1;
                    continue;
                }

                let Some(task) = st.queue.remove(i) else {
                    break;
                };
                let task_label = label(&task);
                let Some(queue_task) = self
                    .guard_hook("create_task_callable", || self.factory.create_task_callable(&task))
                else {
                    self.bus.publish(
                        Event::new(EventKind::TaskRejected)
                            .with_task(task_label)
                            .with_reason("task factory panicked"),
                    );
                    rejected.push(task);
                    continue;
                };

                st.counters.increment(&key);
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                match pool.submit(id, Arc::clone(&queue_task)) {
                    Ok(handle) => {
                        st.executing.insert(
                            id,
                            InFlight {
                                task,
                                queue_task,
                                handle,
                                restriction: Arc::clone(&key),
                            },
                        );
                        self.bus.publish(
                            Event::new(EventKind::TaskScheduled)
                                .with_task(task_label)
                                .with_restriction(key)
                                .with_id(id),
                        );
                    }
                    Err(err) => {
                        st.counters.decrement(&key);
                        self.bus.publish(
                            Event::new(EventKind::TaskRejected)
                                .with_task(task_label)
                                .with_restriction(key)
                                .with_reason(err.to_string()),
                        );
                        rejected.push(task);
                    }
                }
            }
            if !scanned_all {
                blocked.extend(st.blocked.drain());
            }
            st.blocked = blocked;
            st.check_schedule_tasks = false;
        }

        for task in rejected {
            self.notify_removed(task, true);
        }
        Pass::Scanned
    }
}
