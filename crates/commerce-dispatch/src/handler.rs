//! Resource handlers and the registry that maps resource names to them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use commerce_service::CommerceService;
use commerce_types::RequestContext;

use crate::config::DispatchConfig;
use crate::handlers::{self, RESOURCES};
use crate::outcome::DispatchOutcome;

/// Handles every action of one resource.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// The resource segment this handler answers to, e.g. `"payment"`.
    fn resource(&self) -> &'static str;

    /// Actions with a typed request behind them.
    fn actions(&self) -> &'static [&'static str];

    /// Decode `payload` for `action` and call the service. Actions outside
    /// [`actions`](Self::actions) yield [`DispatchOutcome::UnhandledAction`].
    async fn handle(
        &self,
        ctx: &RequestContext,
        action: &str,
        payload: Option<&Value>,
    ) -> DispatchOutcome;
}

/// Resource name to handler, built once at startup.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<&'static str, Arc<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the commerce handlers enabled in `config`.
    pub fn commerce(service: Arc<CommerceService>, config: &DispatchConfig) -> Self {
        for name in &config.resources {
            if !RESOURCES.contains(&name.as_str()) {
                warn!(resource = %name, "ignoring unknown dispatch resource");
            }
        }
        let mut registry = Self::new();
        for handler in handlers::all(service) {
            if config.is_enabled(handler.resource()) {
                registry.register(handler);
            }
        }
        registry
    }

    /// Add `handler`, returning the one it replaced.
    pub fn register(
        &mut self,
        handler: Arc<dyn ResourceHandler>,
    ) -> Option<Arc<dyn ResourceHandler>> {
        self.handlers.insert(handler.resource(), handler)
    }

    pub fn get(&self, resource: &str) -> Option<&Arc<dyn ResourceHandler>> {
        self.handlers.get(resource)
    }

    pub fn resources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(k, h)| (k, h.actions())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commerce_service::ServiceConfig;
    use commerce_store::InMemoryCommerceStore;

    struct Echo(&'static str);

    #[async_trait]
    impl ResourceHandler for Echo {
        fn resource(&self) -> &'static str {
            self.0
        }

        fn actions(&self) -> &'static [&'static str] {
            &["ping"]
        }

        async fn handle(
            &self,
            _ctx: &RequestContext,
            action: &str,
            _payload: Option<&Value>,
        ) -> DispatchOutcome {
            if action == "ping" {
                DispatchOutcome::Handled
            } else {
                DispatchOutcome::UnhandledAction
            }
        }
    }

    fn service() -> Arc<CommerceService> {
        Arc::new(CommerceService::new(
            Arc::new(InMemoryCommerceStore::new()),
            ServiceConfig::default(),
        ))
    }

    #[test]
    fn register_replaces_by_resource() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.register(Arc::new(Echo("echo"))).is_none());
        assert!(registry.register(Arc::new(Echo("echo"))).is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("other").is_none());
    }

    #[test]
    fn commerce_registry_covers_every_resource() {
        let registry = HandlerRegistry::commerce(service(), &DispatchConfig::default());
        let mut expected: Vec<&str> = RESOURCES.to_vec();
        expected.sort_unstable();
        assert_eq!(registry.resources().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn config_limits_registration() {
        let config = DispatchConfig {
            resources: vec!["payment".into(), "bogus".into()],
        };
        let registry = HandlerRegistry::commerce(service(), &config);
        assert_eq!(registry.resources().collect::<Vec<_>>(), vec!["payment"]);
        assert_eq!(
            registry.get("payment").unwrap().actions(),
            &["initiate", "confirm", "refund", "get"]
        );
    }
}
