//! # Event subscribers for the queue runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and,
//! behind the `logging` feature, the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! QueueManager ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet
//!                                                                       │
//!                                                      ┌────────────────┼──────────┐
//!                                                      ▼                ▼          ▼
//!                                                  LogWriter        status UI    metrics
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
