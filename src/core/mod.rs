//! Runtime core: queue store, scheduling, execution and lifecycle.
//!
//! The public API from this module is [`QueueManager`] (built through
//! [`QueueManagerBuilder`]) together with its [`ManagerConfig`] and [`QueueStats`].
//!
//! Internal modules:
//! - [`manager`]: public surface, lifecycle (`init` / `stop`) and hook dispatch;
//! - [`scheduler`]: the scheduling loop and one admission pass over the queue;
//! - [`watcher`]: the completion watcher that reaps finished tasks;
//! - [`pool`]: resizable executor pool feeding the completion channel;
//! - [`worker`]: runs one task with timeout, cancellation and panic isolation;
//! - [`state`]: the lock-protected queue, executing set, counters and flags.

mod builder;
mod config;
mod manager;
mod pool;
mod scheduler;
mod state;
mod watcher;
mod worker;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use builder::QueueManagerBuilder;
pub use config::ManagerConfig;
pub use manager::QueueManager;
pub use state::QueueStats;

/// Locks `m`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
