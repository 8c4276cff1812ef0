//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observing the queue manager: status bars,
//! metrics, audit logs. Each subscriber is driven by a dedicated worker fed by a
//! bounded queue owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block the scheduler, the completion
//!   watcher or other subscribers.
//! - A subscriber declares its queue capacity via [`Subscribe::queue_capacity`].
//!   If that queue overflows, events for this subscriber are **dropped** and a
//!   `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use queuevisor::{Event, EventKind, Subscribe};
//!
//! struct Throughput;
//!
//! #[async_trait]
//! impl Subscribe for Throughput {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::TaskCompleted) {
//!             // bump a counter, refresh a status line...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "throughput" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
