//! # Lock-protected manager state.
//!
//! Everything the scheduler and the completion watcher decide on lives in one
//! [`State`] behind the manager mutex: the pending queue, the executing set, the
//! per-key counters, both connection limits and the two flags.
//!
//! ## Invariants
//! - A task is in at most one of `queue` and `executing`.
//! - `counters[key]` equals the number of `executing` entries admitted under `key`.
//! - `pool` is `Some` exactly while the loops of one generation are running.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use super::config::ManagerConfig;
use super::pool::ExecutorPool;
use crate::error::TaskError;
use crate::restrictions::RestrictionCounters;
use crate::tasks::{Completed, QueueTaskRef, TaskHandle};

/// One entry of the executing set.
pub(super) struct InFlight<T, R> {
    pub task: T,
    pub queue_task: QueueTaskRef<T, R>,
    pub handle: TaskHandle,
    pub restriction: Arc<str>,
}

impl<T, R> InFlight<T, R> {
    pub fn complete(self, outcome: Result<R, TaskError>, elapsed: Duration) -> Completed<T, R> {
        Completed {
            task: self.task,
            queue_task: self.queue_task,
            handle: self.handle,
            restriction: self.restriction,
            outcome,
            elapsed,
        }
    }
}

pub(super) struct State<T, R> {
    pub queue: VecDeque<T>,
    pub executing: HashMap<u64, InFlight<T, R>>,
    pub counters: RestrictionCounters,
    /// Keys that had a queued task skipped in the last scan.
    pub blocked: HashSet<Arc<str>>,
    pub max_connection_count: usize,
    pub max_connection_count_per_host: usize,
    pub stop: bool,
    pub check_schedule_tasks: bool,
    pub pool: Option<Arc<ExecutorPool<R>>>,
}

impl<T: PartialEq, R> State<T, R> {
    pub fn new(cfg: &ManagerConfig) -> Self {
        Self {
            queue: VecDeque::new(),
            executing: HashMap::new(),
            counters: RestrictionCounters::new(),
            blocked: HashSet::new(),
            max_connection_count: cfg.max_connection_count,
            max_connection_count_per_host: cfg.max_connection_count_per_host,
            stop: true,
            check_schedule_tasks: false,
            pool: None,
        }
    }

    /// `true` if an equal task is queued or executing.
    pub fn contains(&self, task: &T) -> bool {
        self.queue.iter().any(|t| t == task) || self.executing.values().any(|f| f.task == *task)
    }

    pub fn open_slots(&self) -> usize {
        self.max_connection_count.saturating_sub(self.executing.len())
    }

    /// Whether a scheduling pass could promote anything right now.
    pub fn wants_pass(&self) -> bool {
        self.check_schedule_tasks
            && !self.queue.is_empty()
            && self.executing.len() < self.max_connection_count
    }
}

/// Point-in-time snapshot of a [`QueueManager`](crate::QueueManager).
///
/// Fields are read under one lock acquisition, so they are consistent with each
/// other (session counters excepted).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Tasks waiting in the queue.
    pub queued: usize,
    /// Tasks currently executing.
    pub executing: usize,
    /// `max_connection_count - executing`, floored at zero.
    pub open_slots: usize,
    /// Global connection ceiling.
    pub max_connection_count: usize,
    /// Default per-key ceiling.
    pub max_connection_count_per_host: usize,
    /// Restriction keys with executing tasks, sorted by key.
    pub per_key: Vec<(String, usize)>,
    /// Session file counter.
    pub session_files: u64,
    /// Session byte counter.
    pub session_bytes: u64,
}
