use std::sync::Arc;

use commerce_fabric::{BusConfig, EventBus, EventFilter, EventStream};
use commerce_store::InMemoryCommerceStore;

use crate::cache::InMemoryCache;
use crate::config::ServiceConfig;
use crate::service::CommerceService;

pub(crate) struct Harness {
    pub service: CommerceService,
    pub store: InMemoryCommerceStore,
    pub bus: Arc<EventBus>,
    pub cache: Arc<InMemoryCache>,
    pub notifications: EventStream,
}

pub(crate) fn harness() -> Harness {
    harness_with(ServiceConfig::default())
}

pub(crate) fn harness_with(config: ServiceConfig) -> Harness {
    let store = InMemoryCommerceStore::new();
    let bus = Arc::new(EventBus::new(BusConfig::default()));
    let cache = Arc::new(InMemoryCache::new());
    let notifications = bus
        .subscribe(EventFilter::for_types(&["commerce.*"]).unwrap())
        .unwrap();
    let service = CommerceService::new(Arc::new(store.clone()), config)
        .with_events(bus.clone())
        .with_cache(cache.clone());
    Harness {
        service,
        store,
        bus,
        cache,
        notifications,
    }
}

impl Harness {
    /// Event types published so far, in order.
    pub fn drain(&mut self) -> Vec<String> {
        let mut seen = Vec::new();
        while let Ok(event) = self.notifications.try_recv() {
            seen.push(event.event_type);
        }
        seen
    }
}
