//! Ledger service facade for the commerce core.
//!
//! [`CommerceService`] sits between callers (the dispatcher, the HTTP
//! surface) and a [`CommerceStore`](commerce_store::CommerceStore). It owns
//! request validation, business-key generation, metadata preparation, status
//! transition checks, and the best-effort side effects that follow a write.

pub mod banking;
pub mod cache;
pub mod commerce;
pub mod config;
pub mod error;
pub mod events;
pub mod exchange;
pub mod investment;
pub mod marketplace;
pub mod requests;
pub mod service;

#[cfg(test)]
mod testing;

pub use cache::{metadata_key, Cache, CacheError, InMemoryCache};
pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use service::CommerceService;
