//! In-process event bus
//!
//! Observers register per topic, optionally scoped to one site. Publishing
//! snapshots the matching handlers under a read lock and invokes them after
//! the lock is released, so handlers may subscribe or unsubscribe freely.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;
use userdeck_core::{EventBus, EventHandler, Subscription};
use userdeck_domain::{ProfileEvent, SiteId};

struct Observer {
    id: u64,
    scope: Option<SiteId>,
    handler: EventHandler,
}

impl Observer {
    fn accepts(&self, scope: Option<&SiteId>) -> bool {
        match (&self.scope, scope) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    observers: HashMap<String, Vec<Observer>>,
}

/// `EventBus` delivering events synchronously within the process
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    registry: Arc<RwLock<Registry>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions for `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry.read().observers.get(topic).map_or(0, Vec::len)
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(&self, topic: &str, event: ProfileEvent, scope: Option<&SiteId>) {
        let handlers: Vec<EventHandler> = self
            .registry
            .read()
            .observers
            .get(topic)
            .map(|observers| {
                observers
                    .iter()
                    .filter(|observer| observer.accepts(scope))
                    .map(|observer| Arc::clone(&observer.handler))
                    .collect()
            })
            .unwrap_or_default();

        trace!(topic, scope = ?scope.map(SiteId::as_str), delivered = handlers.len(), "publishing event");

        for handler in handlers {
            handler(&event);
        }
    }

    fn subscribe(&self, topic: &str, scope: Option<SiteId>, handler: EventHandler) -> Subscription {
        let id = {
            let mut registry = self.registry.write();
            let id = registry.next_id;
            registry.next_id += 1;
            registry
                .observers
                .entry(topic.to_string())
                .or_default()
                .push(Observer { id, scope, handler });
            id
        };

        let registry: Weak<RwLock<Registry>> = Arc::downgrade(&self.registry);
        let topic = topic.to_string();
        Subscription::new(id, move || {
            if let Some(registry) = registry.upgrade() {
                let mut registry = registry.write();
                if let Some(observers) = registry.observers.get_mut(&topic) {
                    observers.retain(|observer| observer.id != id);
                    if observers.is_empty() {
                        registry.observers.remove(&topic);
                    }
                }
            }
        })
    }
}
