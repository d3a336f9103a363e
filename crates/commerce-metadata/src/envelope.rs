use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A free-form JSON object section.
pub type Section = Map<String, Value>;

/// Versioned metadata document attached to every persisted record.
///
/// Known sections are optional and omitted from the serialized form when
/// absent. `service_specific` is always present, possibly empty, and holds
/// per-service extensions keyed by namespace.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versioning: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_partners: Option<Vec<PaymentPartner>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_context: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraud_signals: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orchestration: Option<Section>,
    #[serde(default)]
    pub service_specific: Section,
}

impl MetadataEnvelope {
    /// Names of the known top-level sections, in serialization order.
    pub const SECTIONS: [&'static str; 9] = [
        "versioning",
        "payment_partners",
        "payment_context",
        "fraud_signals",
        "analytics",
        "audit",
        "compliance",
        "orchestration",
        "service_specific",
    ];

    pub fn empty() -> Self {
        Self::default()
    }

    /// `true` when every known section is absent and `service_specific` is empty.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Mutable access to a named object section, creating it when absent.
    ///
    /// Returns `None` for `payment_partners` (not an object) and unknown names.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        let slot = match name {
            "versioning" => &mut self.versioning,
            "payment_context" => &mut self.payment_context,
            "fraud_signals" => &mut self.fraud_signals,
            "analytics" => &mut self.analytics,
            "audit" => &mut self.audit,
            "compliance" => &mut self.compliance,
            "orchestration" => &mut self.orchestration,
            "service_specific" => return Some(&mut self.service_specific),
            _ => return None,
        };
        Some(slot.get_or_insert_with(Map::new))
    }

    /// Value stored under `service_specific.<namespace>`.
    pub fn namespace(&self, namespace: &str) -> Option<&Value> {
        self.service_specific.get(namespace)
    }
}

/// A payment partner recommendation carried in the envelope.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentPartner {
    pub partner_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub supported_locales: Vec<String>,
    #[serde(default)]
    pub supported_countries: Vec<String>,
    #[serde(default)]
    pub supported_currencies: Vec<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance: Option<Section>,
}
