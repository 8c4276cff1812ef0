//! # QueueManager: bounded task queue with per-key connection restriction.
//!
//! The [`QueueManager`] owns the pending queue, the executing set, the per-key
//! counters and the executor pool. Producers call [`add_task_to_queue`]; a scheduler
//! loop promotes queued tasks into the pool while both the global ceiling and the
//! per-key ceiling allow it; a completion watcher reaps finished tasks and wakes the
//! scheduler again.
//!
//! ## High-level architecture
//! ```text
//! add_task_to_queue(t) ──► queue.push_back(t), dirty = true ──► wakeup.notify_one()
//!                                                                   │
//!                            ┌──────────────────────────────────────┘
//!                            ▼
//!                   scheduler loop (one per generation)
//!                     schedule_pass():
//!                       for t in queue (in order):
//!                         executing == max        ─► stop the scan
//!                         counters[key] >= limit  ─► skip, t stays queued
//!                         otherwise               ─► factory ─► pool.submit ─► executing
//!                            │
//!                            ▼
//!                   ExecutorPool (semaphore = max_connection_count)
//!                            │ Completion { id, outcome, elapsed }
//!                            ▼
//!                   completion watcher
//!                     reap(): executing.remove(id), counters[key] -= 1, dirty = true
//!                             ─► hooks.completed_task(..) ─► wakeup.notify_one()
//! ```
//!
//! ## Lifecycle
//! ```text
//! Uninitialized ──init()──► Running ──stop()──► Stopped ──init()──► Running ...
//!
//! stop():                 (teardown runs on its own task; dropping the caller's
//!                           future does not interrupt it)
//!   ├─► stop = true, cancel every in-flight handle, pool.shutdown_now()
//!   ├─► wake and join the scheduler
//!   ├─► cancel and join the watcher (hands the completion receiver back)
//!   ├─► reap completions until the pool terminates, bounded by `stop_grace`
//!   │      ├─ terminated  ─► AllStoppedWithin
//!   │      └─ timed out   ─► GraceExceeded, leftovers reported as Canceled
//!   └─► ManagerStopped
//! ```
//!
//! ## Rules
//! - Every mutation and every scheduling decision happens under the state lock.
//! - `restriction_for_task` and the task factory run under the lock; the other two
//!   hooks run without it and may call back into the manager.
//! - A panicking hook is caught and reported as `HookPanicked`.
//! - The queue survives `stop()`; a later `init()` resumes it.
//!
//! [`add_task_to_queue`]: QueueManager::add_task_to_queue

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::builder::QueueManagerBuilder;
use super::config::ManagerConfig;
use super::pool::{Completion, ExecutorPool};
use super::state::{InFlight, QueueStats, State};
use super::{lock, scheduler, watcher};
use crate::error::{QueueError, TaskError};
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{SubscriberSet, panic_message};
use crate::tasks::{Completed, QueueHooks, QueueItem, QueueTaskFactory};

/// Loops of one running generation.
struct Loops<R> {
    generation: u64,
    scheduler: JoinHandle<()>,
    watcher: JoinHandle<mpsc::Receiver<Completion<R>>>,
    watcher_token: CancellationToken,
}

enum Lifecycle<R> {
    Idle,
    Running(Loops<R>),
    Stopping,
}

/// Restricted concurrent queue manager.
///
/// Construct it with [`QueueManager::builder`]; the builder returns an `Arc` because
/// both background loops hold a reference to the manager while it runs.
pub struct QueueManager<T, R> {
    pub(super) cfg: ManagerConfig,
    pub(super) bus: Bus,
    pub(super) factory: Arc<dyn QueueTaskFactory<T, R>>,
    pub(super) hooks: Arc<dyn QueueHooks<T, R>>,

    pub(super) state: Mutex<State<T, R>>,
    pub(super) wakeup: Notify,
    lifecycle: Mutex<Lifecycle<R>>,
    generation: AtomicU64,
    pub(super) next_id: AtomicU64,

    session_files: AtomicU64,
    session_bytes: AtomicU64,

    /// Cancelled on drop; ends the subscriber listener.
    lifetime: CancellationToken,
}

impl<T: QueueItem, R: Send + 'static> QueueManager<T, R> {
    /// Starts building a manager around the given factory and hooks.
    pub fn builder(
        cfg: ManagerConfig,
        factory: Arc<dyn QueueTaskFactory<T, R>>,
        hooks: Arc<dyn QueueHooks<T, R>>,
    ) -> QueueManagerBuilder<T, R> {
        QueueManagerBuilder::new(cfg, factory, hooks)
    }

    pub(super) fn new_internal(
        cfg: ManagerConfig,
        bus: Bus,
        factory: Arc<dyn QueueTaskFactory<T, R>>,
        hooks: Arc<dyn QueueHooks<T, R>>,
    ) -> Self {
        let state = State::new(&cfg);
        Self {
            cfg,
            bus,
            factory,
            hooks,
            state: Mutex::new(state),
            wakeup: Notify::new(),
            lifecycle: Mutex::new(Lifecycle::Idle),
            generation: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            session_files: AtomicU64::new(0),
            session_bytes: AtomicU64::new(0),
            lifetime: CancellationToken::new(),
        }
    }

    /// Forwards bus events to the subscriber set until the manager is dropped,
    /// then lets every subscriber drain its queue.
    pub(super) fn subscriber_listener(&self, set: SubscriberSet) {
        if set.is_empty() {
            return;
        }
        let mut rx = self.bus.subscribe();
        let lifetime = self.lifetime.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = lifetime.cancelled() => {
                        while let Ok(ev) = rx.try_recv() {
                            set.emit(ev);
                        }
                        break;
                    }
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(ev),
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            set.shutdown().await;
        });
    }

    /// Returns a receiver observing every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    // ---- lifecycle ----

    /// Starts the scheduler and the completion watcher.
    ///
    /// No-op while the loops are running (or being stopped). Otherwise clears the
    /// stop flag, marks the queue dirty, zeroes the per-key counters and creates a
    /// fresh executor pool sized to the current `max_connection_count`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(self: &Arc<Self>) {
        let mut life = lock(&self.lifecycle);
        if !matches!(*life, Lifecycle::Idle) {
            return;
        }
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::channel(self.cfg.completion_capacity_clamped());

        let limit = {
            let mut st = lock(&self.state);
            st.stop = false;
            st.check_schedule_tasks = true;
            st.counters.reset();
            st.blocked.clear();
            st.pool = Some(ExecutorPool::new(
                st.max_connection_count,
                tx,
                self.cfg.task_timeout(),
            ));
            st.max_connection_count
        };

        let watcher_token = CancellationToken::new();
        let scheduler = tokio::spawn(scheduler::run(Arc::clone(self)));
        let watcher = tokio::spawn(watcher::run(Arc::clone(self), rx, watcher_token.clone()));
        *life = Lifecycle::Running(Loops {
            generation,
            scheduler,
            watcher,
            watcher_token,
        });
        drop(life);

        self.bus.publish(
            Event::new(EventKind::ManagerStarted)
                .with_generation(generation)
                .with_limit(limit),
        );
    }

    /// Stops both loops and drains the executing set.
    ///
    /// No-op if the manager is not running. In-flight tasks are cancelled; the call
    /// waits up to [`ManagerConfig::stop_grace`] for them to report back. Tasks that
    /// do not are reported to `completed_task` as [`TaskError::Canceled`], so
    /// `task_count() == 0` once this returns. Queued tasks stay queued.
    ///
    /// The teardown runs on its own task: dropping the returned future (for example
    /// under `tokio::time::timeout`) does not interrupt it, and the manager becomes
    /// idle again once it finishes.
    pub async fn stop(self: &Arc<Self>) {
        let loops = {
            let mut life = lock(&self.lifecycle);
            match std::mem::replace(&mut *life, Lifecycle::Stopping) {
                Lifecycle::Running(loops) => loops,
                other => {
                    *life = other;
                    return;
                }
            }
        };
        let mgr = Arc::clone(self);
        let _ = tokio::spawn(async move { mgr.teardown(loops).await }).await;
    }

    async fn teardown(&self, loops: Loops<R>) {
        let generation = loops.generation;
        self.bus
            .publish(Event::new(EventKind::StopRequested).with_generation(generation));

        let pool = {
            let mut st = lock(&self.state);
            st.stop = true;
            for f in st.executing.values() {
                f.handle.cancel();
            }
            st.pool.take()
        };
        if let Some(pool) = &pool {
            pool.shutdown_now();
        }
        drop(pool);

        self.wakeup.notify_one();
        let _ = loops.scheduler.await;
        loops.watcher_token.cancel();
        let rx = loops.watcher.await.ok();

        let drained = match rx {
            Some(mut rx) => {
                let grace = self.cfg.stop_grace;
                let done = async {
                    while let Some(c) = rx.recv().await {
                        self.reap(c);
                    }
                };
                let terminated = tokio::time::timeout(grace, done).await.is_ok();
                self.remove_task_callables(&mut rx);
                terminated
            }
            None => false,
        };

        let stuck = self.abandon_executing();
        if drained && stuck.is_empty() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
        } else {
            let err = QueueError::GraceExceeded {
                grace: self.cfg.stop_grace,
                stuck,
            };
            self.bus
                .publish(Event::new(EventKind::GraceExceeded).with_reason(err.to_string()));
        }

        *lock(&self.lifecycle) = Lifecycle::Idle;
        self.bus
            .publish(Event::new(EventKind::ManagerStopped).with_generation(generation));
    }

    /// Reports every remaining executing entry as cancelled; returns their labels.
    fn abandon_executing(&self) -> Vec<String> {
        let leftovers: Vec<InFlight<T, R>> = {
            let mut st = lock(&self.state);
            let st = &mut *st;
            let out: Vec<_> = st.executing.drain().map(|(_, f)| f).collect();
            for f in &out {
                st.counters.decrement(&f.restriction);
            }
            out
        };

        let mut stuck = Vec::with_capacity(leftovers.len());
        for f in leftovers {
            let label = label(&f.task);
            stuck.push(label.to_string());
            self.bus.publish(
                Event::new(EventKind::TaskCanceled)
                    .with_task(label)
                    .with_restriction(Arc::clone(&f.restriction))
                    .with_id(f.handle.id()),
            );
            self.notify_completed(f.complete(Err(TaskError::Canceled), std::time::Duration::ZERO));
        }
        stuck
    }

    /// `true` while the scheduler and the watcher of some generation are alive.
    pub fn is_running(&self) -> bool {
        matches!(*lock(&self.lifecycle), Lifecycle::Running(_))
    }

    // ---- queue store ----

    /// Appends `task` unless an equal task is already queued or executing.
    ///
    /// Returns `false` for a duplicate. Works in any lifecycle state; tasks added
    /// before `init()` wait for it.
    pub fn add_task_to_queue(&self, task: T) -> bool {
        let label = label(&task);
        let added = {
            let mut st = lock(&self.state);
            if st.contains(&task) {
                false
            } else {
                st.queue.push_back(task);
                st.check_schedule_tasks = true;
                true
            }
        };

        let kind = if added {
            EventKind::TaskQueued
        } else {
            EventKind::TaskDuplicate
        };
        self.bus.publish(Event::new(kind).with_task(label));
        if added {
            self.wakeup.notify_one();
        }
        added
    }

    /// Batch form of [`add_task_to_queue`](Self::add_task_to_queue) with a single
    /// wakeup. Returns how many tasks were actually appended.
    pub fn add_tasks_to_queue<I>(&self, tasks: I) -> usize
    where
        I: IntoIterator<Item = T>,
    {
        let mut events = Vec::new();
        {
            let mut st = lock(&self.state);
            for task in tasks {
                let label = label(&task);
                if st.contains(&task) {
                    events.push(Event::new(EventKind::TaskDuplicate).with_task(label));
                } else {
                    st.queue.push_back(task);
                    events.push(Event::new(EventKind::TaskQueued).with_task(label));
                }
            }
            if events.iter().any(|e| e.kind == EventKind::TaskQueued) {
                st.check_schedule_tasks = true;
            }
        }

        let added = events
            .iter()
            .filter(|e| e.kind == EventKind::TaskQueued)
            .count();
        for ev in events {
            self.bus.publish(ev);
        }
        if added > 0 {
            self.wakeup.notify_one();
        }
        added
    }

    /// Removes a single queued task; executing tasks are not affected.
    ///
    /// Calls `removed_task_from_queue(task, false)` and returns `true` if it was queued.
    pub fn remove_task_from_queue(&self, task: &T) -> bool {
        let removed = {
            let mut st = lock(&self.state);
            st.queue
                .iter()
                .position(|t| t == task)
                .and_then(|i| st.queue.remove(i))
        };
        match removed {
            Some(task) => {
                self.bus
                    .publish(Event::new(EventKind::TaskRemovedFromQueue).with_task(label(&task)));
                self.notify_removed(task, false);
                true
            }
            None => false,
        }
    }

    /// Empties the queue, calling `removed_task_from_queue(task, false)` for every
    /// queued task in order. With `cancel_executing` the in-flight tasks are
    /// cancelled as well; they still report through `completed_task`.
    ///
    /// The loops keep running.
    pub fn cancel_tasks(&self, cancel_executing: bool) {
        let drained: Vec<T> = {
            let mut st = lock(&self.state);
            if cancel_executing {
                for f in st.executing.values() {
                    f.handle.cancel();
                }
            }
            st.queue.drain(..).collect()
        };
        for task in drained {
            self.bus
                .publish(Event::new(EventKind::TaskRemovedFromQueue).with_task(label(&task)));
            self.notify_removed(task, false);
        }
    }

    // ---- limits ----

    /// Changes the global ceiling and resizes the executor pool immediately.
    ///
    /// Running tasks are never interrupted by a shrink; it only caps promotions.
    pub fn set_max_connection_count(&self, max_connection_count: usize) {
        let grew = {
            let mut st = lock(&self.state);
            let grew = max_connection_count > st.max_connection_count;
            st.max_connection_count = max_connection_count;
            if let Some(pool) = &st.pool {
                pool.set_capacity(max_connection_count);
            }
            if grew {
                st.check_schedule_tasks = true;
            }
            grew
        };
        self.bus.publish(
            Event::new(EventKind::LimitsChanged)
                .with_limit(max_connection_count)
                .with_reason("max_connection_count"),
        );
        if grew {
            self.wakeup.notify_one();
        }
    }

    /// Changes the per-key ceiling applied to restrictions that declare none.
    pub fn set_max_connection_count_per_host(&self, max_connection_count_per_host: usize) {
        let grew = {
            let mut st = lock(&self.state);
            let grew = max_connection_count_per_host > st.max_connection_count_per_host;
            st.max_connection_count_per_host = max_connection_count_per_host;
            if grew {
                st.check_schedule_tasks = true;
            }
            grew
        };
        self.bus.publish(
            Event::new(EventKind::LimitsChanged)
                .with_limit(max_connection_count_per_host)
                .with_reason("max_connection_count_per_host"),
        );
        if grew {
            self.wakeup.notify_one();
        }
    }

    // ---- reads ----

    /// Number of queued tasks.
    pub fn queue_size(&self) -> usize {
        lock(&self.state).queue.len()
    }

    /// Number of executing tasks.
    pub fn task_count(&self) -> usize {
        lock(&self.state).executing.len()
    }

    pub fn is_executing_tasks(&self) -> bool {
        !lock(&self.state).executing.is_empty()
    }

    /// `max_connection_count - task_count()`, never below zero.
    pub fn open_slots(&self) -> usize {
        lock(&self.state).open_slots()
    }

    pub fn max_connection_count(&self) -> usize {
        lock(&self.state).max_connection_count
    }

    pub fn max_connection_count_per_host(&self) -> usize {
        lock(&self.state).max_connection_count_per_host
    }

    /// `true` if an equal task is waiting in the queue.
    pub fn is_queued(&self, task: &T) -> bool {
        lock(&self.state).queue.iter().any(|t| t == task)
    }

    /// Number of executing tasks admitted under `key`.
    pub fn restriction_count(&self, key: &str) -> usize {
        lock(&self.state).counters.get(key)
    }

    pub fn stats(&self) -> QueueStats {
        let st = lock(&self.state);
        QueueStats {
            queued: st.queue.len(),
            executing: st.executing.len(),
            open_slots: st.open_slots(),
            max_connection_count: st.max_connection_count,
            max_connection_count_per_host: st.max_connection_count_per_host,
            per_key: st.counters.snapshot(),
            session_files: self.session_files(),
            session_bytes: self.session_bytes(),
        }
    }

    // ---- session counters ----

    pub fn increase_session_files(&self) {
        self.session_files.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increase_session_bytes(&self, bytes: u64) {
        self.session_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn session_files(&self) -> u64 {
        self.session_files.load(Ordering::Relaxed)
    }

    pub fn session_bytes(&self) -> u64 {
        self.session_bytes.load(Ordering::Relaxed)
    }

    /// Zeroes both session counters.
    pub fn reset_session(&self) {
        self.session_files.store(0, Ordering::Relaxed);
        self.session_bytes.store(0, Ordering::Relaxed);
    }

    // ---- hook dispatch ----

    /// Runs `f`, turning a panic into a `HookPanicked` event.
    pub(super) fn guard_hook<U>(&self, hook: &'static str, f: impl FnOnce() -> U) -> Option<U> {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(v) => Some(v),
            Err(payload) => {
                self.bus.publish(
                    Event::new(EventKind::HookPanicked)
                        .with_task(hook)
                        .with_reason(panic_message(&*payload)),
                );
                None
            }
        }
    }

    /// Calls `removed_task_from_queue`; the state lock must not be held.
    pub(super) fn notify_removed(&self, task: T, execute_failure: bool) {
        self.guard_hook("removed_task_from_queue", || {
            self.hooks.removed_task_from_queue(task, execute_failure)
        });
    }

    /// Calls `completed_task`; the state lock must not be held.
    pub(super) fn notify_completed(&self, completed: Completed<T, R>) {
        self.guard_hook("completed_task", || self.hooks.completed_task(completed));
    }
}

impl<T, R> Drop for QueueManager<T, R> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

/// Label used for a task in events.
pub(super) fn label<T: std::fmt::Debug>(task: &T) -> Arc<str> {
    Arc::from(format!("{task:?}"))
}
