use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use commerce_fabric::{BusEvent, EventSink};
use commerce_metadata::{
    canonicalize, ensure_versioning, stamp_audit, to_value, validate, MetadataEnvelope,
};
use commerce_store::{CommerceEvent, CommerceStore, Record};
use commerce_types::{KeyClock, RequestContext};

use crate::cache::{metadata_key, Cache};
use crate::config::ServiceConfig;
use crate::error::ServiceResult;

/// The ledger service facade.
///
/// Validates requests before any I/O, derives business keys, prepares the
/// metadata envelope, and delegates persistence to a [`CommerceStore`].
/// After a successful write it publishes a notification, refreshes the
/// metadata cache, and appends an audit row; each of these is bounded by
/// [`ServiceConfig::emit_timeout`] and never fails the write.
pub struct CommerceService {
    pub(crate) store: Arc<dyn CommerceStore>,
    events: Option<Arc<dyn EventSink>>,
    cache: Option<Arc<dyn Cache>>,
    config: ServiceConfig,
    pub(crate) keys: KeyClock,
}

impl CommerceService {
    pub fn new(store: Arc<dyn CommerceStore>, config: ServiceConfig) -> Self {
        Self {
            store,
            events: None,
            cache: None,
            config,
            keys: KeyClock::new(),
        }
    }

    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn store(&self) -> &Arc<dyn CommerceStore> {
        &self.store
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Canonicalize caller metadata, fill versioning, stamp the audit
    /// section and enforce size limits.
    pub(crate) fn prepare_metadata(
        &self,
        ctx: &RequestContext,
        raw: Option<&Value>,
        operation: &str,
    ) -> ServiceResult<MetadataEnvelope> {
        let mut envelope = canonicalize(raw);
        ensure_versioning(&mut envelope, &self.config.service_version);
        stamp_audit(&mut envelope, ctx.actor(), operation, Utc::now());
        validate(&envelope)?;
        Ok(envelope)
    }

    /// Best-effort side effects of a committed write.
    pub(crate) async fn after_write<R>(&self, ctx: &RequestContext, event_type: &str, record: &R)
    where
        R: Record + Serialize,
    {
        let key = record.key();
        let metadata = to_value(record.metadata());

        if self.config.events_enabled {
            if let Some(sink) = &self.events {
                let event = BusEvent::new(event_type)
                    .with_entity_key(key.clone())
                    .with_campaign(record.campaign_id())
                    .with_metadata(metadata.clone());
                self.best_effort("emit", event_type, &key, async {
                    sink.emit(event).await.map(|_| ())
                })
                .await;
            }
        }

        if self.config.cache_enabled {
            if let Some(cache) = &self.cache {
                let cache_key = metadata_key(R::ENTITY, &key);
                let ttl = self.config.cache_ttl();
                self.best_effort("cache", event_type, &key, async {
                    cache.put(&cache_key, metadata.clone(), ttl).await
                })
                .await;
            }
        }

        let payload = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let row = CommerceEvent {
            entity_id: key.clone(),
            entity_type: Some(R::ENTITY),
            event_type: event_type.to_string(),
            payload,
            metadata: record.metadata().clone(),
            campaign_id: record.campaign_id(),
            ..Default::default()
        };
        self.best_effort("audit", event_type, &key, async {
            self.store.log_event(ctx, row).await.map(|_| ())
        })
        .await;
    }

    async fn best_effort<E, F>(&self, effect: &str, event_type: &str, key: &str, fut: F)
    where
        E: std::fmt::Display,
        F: Future<Output = Result<(), E>>,
    {
        match tokio::time::timeout(self.config.emit_timeout(), fut).await {
            Ok(Ok(())) => debug!(effect, event_type, business_key = key, "side effect done"),
            Ok(Err(e)) => {
                warn!(effect, event_type, business_key = key, error = %e, "side effect failed")
            }
            Err(_) => warn!(effect, event_type, business_key = key, "side effect timed out"),
        }
    }
}
