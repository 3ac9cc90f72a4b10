use std::sync::Arc;

use super::coordinator::Coordinator;
use crate::{config::Config, subscribers::Subscribe};

/// Builder for constructing a [`Coordinator`] with optional subscribers.
pub struct CoordinatorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl CoordinatorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every run event (grants, resource hand-offs, timeouts)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the coordinator.
    ///
    /// Nothing is spawned and the configuration is not checked until
    /// [`Coordinator::run`].
    pub fn build(self) -> Coordinator {
        Coordinator::new_internal(self.cfg, self.subscribers)
    }
}
