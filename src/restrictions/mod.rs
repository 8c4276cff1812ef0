//! # Per-key admission control
//!
//! Tasks are grouped by a caller-chosen **restriction key** (typically a host name).
//! Besides the global connection ceiling, each key has its own ceiling:
//!
//! - [`Restriction`] — the policy for one key, resolved per task by
//!   [`QueueHooks::restriction_for_task`](crate::QueueHooks::restriction_for_task).
//! - `RestrictionCounters` — how many tasks are executing under each key right now
//!   (owned by the manager, mutated only under its lock).
//!
//! ## Invariants
//! - A task is admitted only if `count(key) < effective_max(key)`.
//! - Counters never go below zero and are reset by every `init()`.

mod counters;
mod restriction;

pub(crate) use counters::RestrictionCounters;
pub use restriction::Restriction;
