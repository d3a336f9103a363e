use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::envelope::{MetadataEnvelope, PaymentPartner, Section};
use crate::error::{MetadataError, MetadataResult};

/// Build the canonical envelope for arbitrary caller input.
///
/// Never fails. `None`, `null`, and non-object input produce an empty
/// envelope. Within an object:
///
/// - a known section holding an object is kept; `null` or any other shape
///   leaves it absent,
/// - `payment_partners` keeps the array entries that decode as partners,
/// - `service_specific` entries are kept as-is,
/// - unknown top-level keys are folded into `service_specific` unless an
///   explicit entry of the same name exists.
pub fn canonicalize(raw: Option<&Value>) -> MetadataEnvelope {
    let Some(Value::Object(doc)) = raw else {
        if let Some(other) = raw.filter(|v| !v.is_null()) {
            debug!(kind = json_kind(other), "non-object metadata replaced by empty envelope");
        }
        return MetadataEnvelope::empty();
    };

    let mut env = MetadataEnvelope::empty();
    if let Some(Value::Object(extensions)) = doc.get("service_specific") {
        env.service_specific = extensions.clone();
    }

    for (key, value) in doc {
        match key.as_str() {
            "service_specific" => {}
            "payment_partners" => env.payment_partners = partners(value),
            "versioning" => env.versioning = section(key, value),
            "payment_context" => env.payment_context = section(key, value),
            "fraud_signals" => env.fraud_signals = section(key, value),
            "analytics" => env.analytics = section(key, value),
            "audit" => env.audit = section(key, value),
            "compliance" => env.compliance = section(key, value),
            "orchestration" => env.orchestration = section(key, value),
            _ => {
                env.service_specific
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
    }
    env
}

fn section(name: &str, value: &Value) -> Option<Section> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::Null => None,
        other => {
            debug!(section = name, kind = json_kind(other), "dropping non-object metadata section");
            None
        }
    }
}

fn partners(value: &Value) -> Option<Vec<PaymentPartner>> {
    let Value::Array(entries) = value else {
        return None;
    };
    let decoded = entries
        .iter()
        .filter_map(|entry| match serde_json::from_value::<PaymentPartner>(entry.clone()) {
            Ok(partner) => Some(partner),
            Err(e) => {
                debug!(error = %e, "dropping malformed payment partner");
                None
            }
        })
        .collect();
    Some(decoded)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Serialize an envelope to the JSON stored in a record's metadata column.
///
/// Output is deterministic: struct fields serialize in declaration order and
/// object keys in sorted order.
pub fn marshal(envelope: &MetadataEnvelope) -> MetadataResult<Vec<u8>> {
    Ok(serde_json::to_vec(envelope)?)
}

/// Strict decode. Fails on malformed JSON and on non-object documents.
pub fn try_unmarshal(bytes: &[u8]) -> MetadataResult<MetadataEnvelope> {
    if bytes.is_empty() {
        return Ok(MetadataEnvelope::empty());
    }
    let value: Value = serde_json::from_slice(bytes)?;
    if !value.is_object() {
        return Err(MetadataError::NotAnObject);
    }
    Ok(canonicalize(Some(&value)))
}

/// Defensive decode used on every read path.
///
/// Unreadable bytes produce an empty envelope; the failure is logged and
/// never surfaced, so a record with damaged metadata still loads.
pub fn unmarshal(bytes: &[u8]) -> MetadataEnvelope {
    try_unmarshal(bytes).unwrap_or_else(|e| {
        warn!(error = %e, len = bytes.len(), "unreadable metadata replaced by empty envelope");
        MetadataEnvelope::empty()
    })
}

/// Canonical envelope as a JSON value, for responses and cache entries.
pub fn to_value(envelope: &MetadataEnvelope) -> Value {
    serde_json::to_value(envelope).unwrap_or_else(|_| Value::Object(Map::new()))
}
