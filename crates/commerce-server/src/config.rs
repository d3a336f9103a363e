use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use commerce_dispatch::DispatchConfig;
use commerce_fabric::BusConfig;
use commerce_service::ServiceConfig;

use crate::error::{ServerError, ServerResult};

/// Everything a `commerced` node reads from its TOML file. Omitted keys and
/// tables take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub service: ServiceConfig,
    pub bus: BusConfig,
    pub dispatch: DispatchConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8787)),
            log_filter: "info,tower_http=info".into(),
            service: ServiceConfig::default(),
            bus: BusConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}
