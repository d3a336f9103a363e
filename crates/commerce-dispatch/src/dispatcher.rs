//! Routes inbound bus events to resource handlers.
//!
//! Dispatch is at-most-once: an event that cannot be routed, decoded, or
//! served is counted, logged at `warn`, and dropped. Nothing is ever handed
//! back to the event source.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use commerce_fabric::{BusEvent, EventFilter, EventSource, EventStream};
use commerce_types::RequestContext;

use crate::error::{DispatchError, DispatchResult};
use crate::handler::HandlerRegistry;
use crate::outcome::{DispatchOutcome, DispatchStats, DispatchStatsSnapshot};
use crate::route::Route;

/// Actor recorded in the audit section of records written by dispatch.
pub const DISPATCH_ACTOR: &str = "dispatcher";

#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    stats: Arc<DispatchStats>,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            stats: Arc::new(DispatchStats::default()),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Run one event through its handler and record the outcome.
    pub async fn dispatch(&self, event: &BusEvent) -> DispatchOutcome {
        let outcome = self.route(event).await;
        self.stats.record(outcome);
        if outcome.is_dropped() {
            warn!(
                event_type = %event.event_type,
                event_id = %event.id,
                outcome = %outcome,
                "event dropped"
            );
        } else {
            debug!(event_type = %event.event_type, event_id = %event.id, "event dispatched");
        }
        outcome
    }

    async fn route(&self, event: &BusEvent) -> DispatchOutcome {
        let Some(route) = Route::parse(&event.event_type) else {
            return DispatchOutcome::MalformedEventType;
        };
        let Some(handler) = self.registry.get(&route.resource) else {
            return DispatchOutcome::UnknownResource;
        };
        let ctx = RequestContext::new().with_actor(DISPATCH_ACTOR);
        handler
            .handle(&ctx, &route.action, event.payload.as_ref())
            .await
    }

    /// Subscribe one worker per registered resource. Each worker runs until
    /// the source closes its stream.
    pub fn spawn_workers(&self, source: &dyn EventSource) -> DispatchResult<Vec<JoinHandle<()>>> {
        let mut streams = Vec::with_capacity(self.registry.len());
        for resource in self.registry.resources() {
            let stream = EventFilter::for_types(&Route::patterns(resource))
                .and_then(|filter| source.subscribe(filter))
                .map_err(|err| DispatchError::Subscribe {
                    resource,
                    source: err,
                })?;
            streams.push((resource, stream));
        }
        Ok(streams
            .into_iter()
            .map(|(resource, stream)| tokio::spawn(self.clone().run_worker(resource, stream)))
            .collect())
    }

    async fn run_worker(self, resource: &'static str, mut stream: EventStream) {
        info!(resource, "dispatch worker started");
        loop {
            match stream.recv().await {
                Ok(event) => {
                    self.dispatch(&event).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(resource, skipped, "dispatch worker lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        info!(resource, "dispatch worker stopped");
    }
}
