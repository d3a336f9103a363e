use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use commerce_types::CampaignId;

use crate::error::{FabricError, FabricResult};
use crate::event::{BusEvent, EventPattern};

/// Which events a subscriber receives.
///
/// An event is delivered when its type matches any of `patterns` and it
/// passes the optional campaign and entity-key constraints. An empty pattern
/// list matches every type.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    pub patterns: Vec<EventPattern>,
    pub campaign_id: Option<CampaignId>,
    pub entity_key: Option<String>,
}

impl EventFilter {
    /// Filter on the given type patterns (see [`EventPattern::parse`]).
    pub fn for_types<S: AsRef<str>>(patterns: &[S]) -> FabricResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| EventPattern::parse(p.as_ref()))
            .collect::<FabricResult<Vec<_>>>()?;
        Ok(Self {
            patterns,
            ..Default::default()
        })
    }

    pub fn in_campaign(mut self, campaign_id: CampaignId) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    pub fn for_entity(mut self, key: impl Into<String>) -> Self {
        self.entity_key = Some(key.into());
        self
    }

    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &BusEvent) -> bool {
        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.matches(&event.event_type)) {
            return false;
        }
        if let Some(campaign) = self.campaign_id {
            if event.campaign_id != campaign {
                return false;
            }
        }
        if let Some(ref key) = self.entity_key {
            if &event.entity_key != key {
                return false;
            }
        }
        true
    }
}

/// A broadcast channel receiver for bus events.
pub type EventStream = broadcast::Receiver<BusEvent>;

/// Producer side of the bus.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver `event`. Returns the number of subscribers that received it.
    async fn emit(&self, event: BusEvent) -> FabricResult<usize>;
}

/// Consumer side of the bus.
pub trait EventSource: Send + Sync {
    /// Register a subscriber. Matching events are delivered to the returned
    /// stream until it is dropped or the source shuts down.
    fn subscribe(&self, filter: EventFilter) -> FabricResult<EventStream>;
}

/// Configuration for the [`EventBus`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Capacity of per-subscriber broadcast channels. A subscriber that falls
    /// further behind than this skips the oldest events.
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Internal subscriber: a filter paired with a broadcast sender.
struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<BusEvent>,
}

/// Fan-out router that delivers events to matching subscribers.
#[derive(Default)]
struct EventRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventRouter {
    fn subscribe(&self, filter: EventFilter, capacity: usize) -> EventStream {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber { filter, sender: tx });
        rx
    }

    /// Route an event to all matching subscribers and return how many
    /// received it. Subscribers whose receivers are gone are pruned.
    fn route(&self, event: &BusEvent) -> usize {
        let mut delivered = 0;
        let mut subs = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subs.retain(|sub| {
            if sub.filter.matches(event) {
                let ok = sub.sender.send(event.clone()).is_ok();
                if ok {
                    delivered += 1;
                }
                ok
            } else {
                sub.sender.receiver_count() > 0
            }
        });
        delivered
    }

    fn clear(&self) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// In-process publish/subscribe bus.
///
/// Delivery is at-most-once: events are not persisted, and a subscriber
/// only sees events published after it subscribed.
#[derive(Default)]
pub struct EventBus {
    router: EventRouter,
    config: BusConfig,
    closed: AtomicBool,
    published: AtomicU64,
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        info!(capacity = config.channel_capacity, "event bus started");
        Self {
            router: EventRouter::default(),
            config,
            closed: AtomicBool::new(false),
            published: AtomicU64::new(0),
        }
    }

    /// Publish an event and return the number of subscribers it reached.
    /// Reaching nobody is not an error.
    pub fn publish(&self, event: BusEvent) -> FabricResult<usize> {
        if self.is_closed() {
            return Err(FabricError::Shutdown);
        }
        let delivered = self.router.route(&event);
        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(id = %event.id, event_type = %event.event_type, delivered, "event published");
        Ok(delivered)
    }

    pub fn subscribe(&self, filter: EventFilter) -> FabricResult<EventStream> {
        if self.is_closed() {
            return Err(FabricError::Shutdown);
        }
        Ok(self.router.subscribe(filter, self.config.channel_capacity))
    }

    /// Stop accepting events and drop every subscriber. Open streams observe
    /// `RecvError::Closed` once they drain.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.router.clear();
            info!("event bus closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Current number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }

    /// Total events accepted since start.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventSink for EventBus {
    async fn emit(&self, event: BusEvent) -> FabricResult<usize> {
        self.publish(event)
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, filter: EventFilter) -> FabricResult<EventStream> {
        EventBus::subscribe(self, filter)
    }
}
