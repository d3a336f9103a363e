use serde::{Deserialize, Serialize};

use crate::handlers::RESOURCES;

/// Which resources get a handler and a worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub resources: Vec<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            resources: RESOURCES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl DispatchConfig {
    pub fn is_enabled(&self, resource: &str) -> bool {
        self.resources.iter().any(|r| r == resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config = DispatchConfig::default();
        for resource in RESOURCES {
            assert!(config.is_enabled(resource));
        }
        assert!(!config.is_enabled("refund"));
    }

    #[test]
    fn missing_field_falls_back() {
        let config: DispatchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DispatchConfig::default());
        let config: DispatchConfig =
            serde_json::from_str(r#"{"resources": ["quote"]}"#).unwrap();
        assert!(config.is_enabled("quote"));
        assert!(!config.is_enabled("order"));
    }
}
