//! # queuevisor
//!
//! **Queuevisor** is a bounded concurrent task queue with per-key connection
//! restriction for async Rust.
//!
//! Producers add tasks; a scheduler promotes them into a resizable executor pool
//! while both the global ceiling (`max_connection_count`) and a per-key ceiling
//! (for example "at most 2 concurrent downloads per host") allow it. A completion
//! watcher reaps finished tasks, hands them to the caller and wakes the scheduler.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   add_task_to_queue(t)      add_tasks_to_queue([..])      cancel_tasks(..)
//!            │                          │                          │
//!            ▼                          ▼                          ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  QueueManager                                                     │
//! │  - queue (insertion order, no duplicates)                         │
//! │  - executing set (id ─► task, queue task, handle, restriction key)│
//! │  - restriction counters (key ─► executing count)                  │
//! │  - limits, stop flag, dirty flag          (all behind one mutex)  │
//! └──────┬─────────────────────────────────────────────────────▲──────┘
//!        │ wakeup (Notify)                                     │ reap
//!        ▼                                                     │
//! ┌──────────────┐  submit   ┌──────────────┐  Completion  ┌──────────────┐
//! │  Scheduler   │ ────────► │ ExecutorPool │ ───────────► │   Watcher    │
//! │ (admission)  │           │ (semaphore)  │   (mpsc)     │ (bookkeeping)│
//! └──────┬───────┘           └──────────────┘              └──────┬───────┘
//!        │ restriction_for_task / create_task_callable            │ completed_task
//!        ▼                                                        ▼
//!                       QueueHooks / QueueTaskFactory (caller)
//!
//! Every step publishes an Event ──► Bus ──► SubscriberSet ──► Subscribe::on_event
//! ```
//!
//! ### Admission
//! ```text
//! for task in queue (in order):
//!   executing == max_connection_count         ─► end of pass
//!   restriction = restriction_for_task(task)
//!   limit = restriction.max_connection_count, or the per-host default if 0
//!   counters[key] >= limit                    ─► skip (stays queued), next task
//!   otherwise                                 ─► promote
//! ```
//! A task blocked on its key does not hold back tasks queued behind it under other keys.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Queue manager** | Queue, schedule, execute and reap tasks; init/stop lifecycle. | [`QueueManager`], [`QueueStats`]            |
//! | **Restrictions**  | Per-key connection ceilings.                                  | [`Restriction`]                             |
//! | **Tasks**         | Caller-defined work and how it is created.                    | [`QueueTask`], [`QueueTaskFactory`], [`QueueTaskFn`] |
//! | **Hooks**         | Restriction lookup, removal and completion callbacks.         | [`QueueHooks`], [`Completed`]               |
//! | **Subscriber API**| Observe runtime events (logging, metrics, UI).                | [`Subscribe`], [`Event`], [`EventKind`]     |
//! | **Errors**        | Typed errors for the runtime and for task execution.          | [`QueueError`], [`TaskError`]               |
//! | **Configuration** | Initial limits, grace period, timeouts, channel sizes.        | [`ManagerConfig`]                           |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] that writes events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use queuevisor::{
//!     Completed, ManagerConfig, QueueHooks, QueueManager, QueueTaskFn, Restriction, TaskError,
//! };
//!
//! struct Hosts;
//!
//! impl QueueHooks<String, usize> for Hosts {
//!     fn restriction_for_task(&self, url: &String) -> Restriction {
//!         let host = url.split('/').nth(2).unwrap_or("");
//!         Restriction::unrestricted(host)
//!     }
//!     fn removed_task_from_queue(&self, _url: String, _execute_failure: bool) {}
//!     fn completed_task(&self, done: Completed<String, usize>) {
//!         println!("{} -> {:?}", done.task(), done.outcome());
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut cfg = ManagerConfig::default();
//!     cfg.max_connection_count = 4;
//!     cfg.max_connection_count_per_host = 2;
//!
//!     let fetch = QueueTaskFn::arc(|url: String, _ctx: CancellationToken| async move {
//!         Ok::<_, TaskError>(url.len())
//!     });
//!
//!     let mgr = QueueManager::<String, usize>::builder(cfg, fetch, Arc::new(Hosts)).build();
//!     mgr.init();
//!     mgr.add_task_to_queue("https://a.example/1".to_string());
//!     mgr.add_task_to_queue("https://a.example/2".to_string());
//!     mgr.add_task_to_queue("https://b.example/1".to_string());
//!
//!     while mgr.queue_size() > 0 || mgr.is_executing_tasks() {
//!         tokio::task::yield_now().await;
//!     }
//!     mgr.stop().await;
//! }
//! ```
mod core;
mod error;
mod events;
mod restrictions;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{ManagerConfig, QueueManager, QueueManagerBuilder, QueueStats};
pub use error::{QueueError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use restrictions::Restriction;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    Completed, QueueHooks, QueueItem, QueueTask, QueueTaskFactory, QueueTaskFn, QueueTaskRef,
    TaskHandle,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
