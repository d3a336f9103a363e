use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use commerce_types::CampaignId;

use crate::error::{FabricError, FabricResult};

/// A single event flowing through the bus.
///
/// Inbound command events carry a `<resource>.<action>` type and an optional
/// structured payload. Outbound notifications from the service carry the
/// business key of the record they describe and its metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusEvent {
    /// Time-ordered unique identifier.
    pub id: Uuid,
    pub event_type: String,
    #[serde(default)]
    pub entity_key: String,
    #[serde(default)]
    pub campaign_id: CampaignId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default)]
    pub metadata: Value,
    pub emitted_at: DateTime<Utc>,
}

impl BusEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            entity_key: String::new(),
            campaign_id: CampaignId::default(),
            payload: None,
            metadata: Value::Null,
            emitted_at: Utc::now(),
        }
    }

    pub fn with_entity_key(mut self, key: impl Into<String>) -> Self {
        self.entity_key = key.into();
        self
    }

    pub fn with_campaign(mut self, campaign_id: CampaignId) -> Self {
        self.campaign_id = campaign_id;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Which event types a subscription receives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventPattern {
    /// `*`: every event.
    Any,
    /// `prefix.*` or `prefix:*`: every type starting with the prefix and its
    /// delimiter (stored with the delimiter).
    Prefix(String),
    /// An exact type name.
    Exact(String),
}

impl EventPattern {
    /// Parse `*`, `prefix.*`, `prefix:*` or an exact type name. A wildcard
    /// anywhere else is rejected.
    pub fn parse(raw: &str) -> FabricResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FabricError::InvalidPattern(raw.to_string()));
        }
        if raw == "*" {
            return Ok(Self::Any);
        }
        let wildcard = raw
            .strip_suffix(".*")
            .map(|prefix| (prefix, '.'))
            .or_else(|| raw.strip_suffix(":*").map(|prefix| (prefix, ':')));
        match wildcard {
            Some((prefix, sep)) if !prefix.is_empty() && !prefix.contains('*') => {
                Ok(Self::Prefix(format!("{prefix}{sep}")))
            }
            Some(_) => Err(FabricError::InvalidPattern(raw.to_string())),
            None if raw.contains('*') => Err(FabricError::InvalidPattern(raw.to_string())),
            None => Ok(Self::Exact(raw.to_string())),
        }
    }

    pub fn matches(&self, event_type: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => event_type.starts_with(prefix.as_str()),
            Self::Exact(name) => event_type == name,
        }
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Exact(name) => f.write_str(name),
        }
    }
}
