use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use commerce_dispatch::{Dispatcher, HandlerRegistry};
use commerce_fabric::EventBus;
use commerce_service::{CommerceService, InMemoryCache};
use commerce_store::InMemoryCommerceStore;

use crate::config::NodeConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// A wired commerce node: store, bus, service facade, and dispatcher.
pub struct CommerceNode {
    config: NodeConfig,
    bus: Arc<EventBus>,
    service: Arc<CommerceService>,
    dispatcher: Dispatcher,
}

impl CommerceNode {
    pub fn new(config: NodeConfig) -> Self {
        let bus = Arc::new(EventBus::new(config.bus.clone()));
        let mut service = CommerceService::new(
            Arc::new(InMemoryCommerceStore::new()),
            config.service.clone(),
        )
        .with_events(bus.clone());
        if config.service.cache_enabled {
            service = service.with_cache(Arc::new(InMemoryCache::new()));
        }
        let service = Arc::new(service);
        let dispatcher = Dispatcher::new(HandlerRegistry::commerce(
            service.clone(),
            &config.dispatch,
        ));
        Self {
            config,
            bus,
            service,
            dispatcher,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<CommerceService> {
        &self.service
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState {
            bus: self.bus.clone(),
            dispatcher: self.dispatcher.clone(),
            service_version: self.config.service.service_version.clone(),
        })
    }

    /// Start one dispatch worker per enabled resource.
    pub fn start_dispatch(&self) -> ServerResult<Vec<JoinHandle<()>>> {
        Ok(self.dispatcher.spawn_workers(self.bus.as_ref())?)
    }

    /// Serve until `shutdown` resolves, then close the bus and wait for the
    /// workers to drain.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> ServerResult<()> {
        let workers = self.start_dispatch()?;
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        info!(
            bind_addr = %self.config.bind_addr,
            resources = self.dispatcher.registry().len(),
            "commerce node listening"
        );
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        self.bus.close();
        for worker in workers {
            if let Err(err) = worker.await {
                warn!(error = %err, "dispatch worker ended abnormally");
            }
        }
        info!("commerce node stopped");
        served
    }
}
