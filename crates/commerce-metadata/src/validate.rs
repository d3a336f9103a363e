use crate::codec::marshal;
use crate::envelope::MetadataEnvelope;
use crate::error::{MetadataError, MetadataResult};

/// Maximum number of `service_specific` namespaces.
pub const MAX_SERVICE_SPECIFIC: usize = 20;
/// Maximum size of the marshalled document.
pub const MAX_DOCUMENT_BYTES: usize = 64 * 1024;
/// Maximum length of a namespace name.
pub const MAX_NAMESPACE_LEN: usize = 256;

/// Check an envelope against the storage limits.
///
/// Applied by the write path before any I/O; reads never validate.
pub fn validate(envelope: &MetadataEnvelope) -> MetadataResult<()> {
    let count = envelope.service_specific.len();
    if count > MAX_SERVICE_SPECIFIC {
        return Err(MetadataError::TooManyNamespaces {
            count,
            max: MAX_SERVICE_SPECIFIC,
        });
    }
    if let Some(bad) = envelope
        .service_specific
        .keys()
        .find(|k| k.trim().is_empty() || k.len() > MAX_NAMESPACE_LEN)
    {
        return Err(MetadataError::InvalidNamespace(bad.clone()));
    }
    let size = marshal(envelope)?.len();
    if size > MAX_DOCUMENT_BYTES {
        return Err(MetadataError::TooLarge {
            size,
            max: MAX_DOCUMENT_BYTES,
        });
    }
    Ok(())
}
