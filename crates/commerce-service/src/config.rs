use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Facade settings, read from the `[service]` table of the node config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Publish `commerce.*` notifications after successful writes.
    pub events_enabled: bool,
    /// Upper bound on each best-effort side effect.
    pub emit_timeout_ms: u64,
    pub cache_enabled: bool,
    /// TTL for cached record metadata.
    pub cache_ttl_secs: u64,
    /// Written to `versioning.service_version` when the caller left it unset.
    pub service_version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            events_enabled: true,
            emit_timeout_ms: 500,
            cache_enabled: true,
            cache_ttl_secs: 600,
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn emit_timeout(&self) -> Duration {
        Duration::from_millis(self.emit_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
