use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::envelope::MetadataEnvelope;

/// Envelope schema version written into `versioning.system_version`.
pub const SYSTEM_VERSION: &str = "1.0.0";

/// Fill `versioning.system_version` and `versioning.service_version` when
/// the caller did not supply them. Existing values are left untouched.
pub fn ensure_versioning(envelope: &mut MetadataEnvelope, service_version: &str) {
    let versioning = envelope.versioning.get_or_insert_with(Default::default);
    versioning
        .entry("system_version")
        .or_insert_with(|| Value::from(SYSTEM_VERSION));
    versioning
        .entry("service_version")
        .or_insert_with(|| Value::from(service_version));
}

/// Record who last wrote the owning record, when, and through which operation.
///
/// `audit.created_at` is set on the first stamp only.
pub fn stamp_audit(envelope: &mut MetadataEnvelope, actor: &str, operation: &str, at: DateTime<Utc>) {
    let ts = Value::from(at.to_rfc3339_opts(SecondsFormat::Millis, true));
    let audit = envelope.audit.get_or_insert_with(Default::default);
    audit.entry("created_at").or_insert_with(|| ts.clone());
    audit.insert("last_modified".into(), ts);
    audit.insert("last_modified_by".into(), Value::from(actor));
    audit.insert("last_operation".into(), Value::from(operation));
}
