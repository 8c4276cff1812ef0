//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the queue manager, its
//! scheduler, the completion watcher and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `QueueManager` (producer API and `stop()`), the scheduler loop,
//!   the completion watcher, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by the builder, which fans out
//!   to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
