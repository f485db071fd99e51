use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use userdeck_core::{EventBus, EventHandler, Subscription};
use userdeck_domain::{ProfileEvent, RefreshEvent, SiteId};

/// Published event together with the topic and scope it was sent under
#[derive(Debug, Clone)]
pub struct Published {
    pub topic: String,
    pub scope: Option<SiteId>,
    pub event: ProfileEvent,
}

type Registered = (u64, String, Option<SiteId>, EventHandler);

/// `EventBus` that records everything published and forwards it to
/// matching handlers.
#[derive(Default)]
pub struct RecordingBus {
    published: Mutex<Vec<Published>>,
    handlers: Arc<Mutex<Vec<Registered>>>,
    next_id: AtomicU64,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn refresh_events(&self) -> Vec<RefreshEvent> {
        self.published()
            .into_iter()
            .map(|published| match published.event {
                ProfileEvent::Refreshed(event) => event,
            })
            .collect()
    }
}

impl EventBus for RecordingBus {
    fn publish(&self, topic: &str, event: ProfileEvent, scope: Option<&SiteId>) {
        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            scope: scope.cloned(),
            event: event.clone(),
        });

        let matching: Vec<EventHandler> = self
            .handlers
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t, s, _)| t == topic && (s.is_none() || s.as_ref() == scope))
            .map(|(_, _, _, handler)| Arc::clone(handler))
            .collect();
        for handler in matching {
            handler(&event);
        }
    }

    fn subscribe(&self, topic: &str, scope: Option<SiteId>, handler: EventHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.lock().unwrap().push((id, topic.to_string(), scope, handler));

        let handlers = Arc::clone(&self.handlers);
        Subscription::new(id, move || {
            handlers.lock().unwrap().retain(|(existing, _, _, _)| *existing != id);
        })
    }
}
