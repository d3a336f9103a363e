//! Canonical metadata envelope for commerce records.
//!
//! Every persisted record carries a [`MetadataEnvelope`]: a versioned JSON
//! document with a fixed set of known sections and an open
//! `service_specific` extension map. This crate turns arbitrary caller input
//! into that canonical shape, writes it as deterministic JSON, and reads it
//! back without ever failing the surrounding operation.
//!
//! # Laws
//!
//! - [`canonicalize`] never fails; absent or non-object input yields an
//!   empty envelope.
//! - `unmarshal(&marshal(&e)?) == e` for every envelope `e` returned by
//!   [`canonicalize`].
//! - [`unmarshal`] on unreadable bytes yields an empty envelope.

pub mod codec;
pub mod enrich;
pub mod envelope;
pub mod error;
pub mod validate;

pub use codec::{canonicalize, marshal, to_value, try_unmarshal, unmarshal};
pub use enrich::{ensure_versioning, stamp_audit, SYSTEM_VERSION};
pub use envelope::{MetadataEnvelope, PaymentPartner, Section};
pub use error::{MetadataError, MetadataResult};
pub use validate::{validate, MAX_DOCUMENT_BYTES, MAX_NAMESPACE_LEN, MAX_SERVICE_SPECIFIC};
