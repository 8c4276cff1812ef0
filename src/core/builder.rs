use std::sync::Arc;

use super::{config::ManagerConfig, manager::QueueManager};
use crate::{
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
    tasks::{QueueHooks, QueueItem, QueueTaskFactory},
};

/// Builder for constructing a [`QueueManager`].
pub struct QueueManagerBuilder<T, R> {
    cfg: ManagerConfig,
    factory: Arc<dyn QueueTaskFactory<T, R>>,
    hooks: Arc<dyn QueueHooks<T, R>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T: QueueItem, R: Send + 'static> QueueManagerBuilder<T, R> {
    /// Creates a new builder with the given configuration and collaborators.
    pub fn new(
        cfg: ManagerConfig,
        factory: Arc<dyn QueueTaskFactory<T, R>>,
        hooks: Arc<dyn QueueHooks<T, R>>,
    ) -> Self {
        Self {
            cfg,
            factory,
            hooks,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (queueing, admission, completion, shutdown)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the manager. It starts idle; call [`QueueManager::init`] to run it.
    ///
    /// Must be called from within a tokio runtime (subscriber workers are spawned here).
    pub fn build(self) -> Arc<QueueManager<T, R>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());

        let mgr = Arc::new(QueueManager::new_internal(
            self.cfg,
            bus,
            self.factory,
            self.hooks,
        ));
        mgr.subscriber_listener(subs);
        mgr
    }
}
