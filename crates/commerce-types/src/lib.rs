//! Foundation types for the commerce core.
//!
//! This crate provides the identity, keying, status, and paging types used
//! throughout the workspace. Every other commerce crate depends on
//! `commerce-types`.
//!
//! # Key Types
//!
//! - [`MasterRef`]: the uniform identity (numeric id + UUID) every domain record carries
//! - [`EntityType`]: the closed set of record kinds known to the master index
//! - [`KeyClock`]: monotonic timestamps for collision-free business keys
//! - [`OrderStatus`], [`PaymentStatus`], [`QuoteStatus`]: total-decoding state machines
//! - [`PageRequest`] / [`Page`]: clamped 1-based pagination
//! - [`RequestContext`]: request identity and cooperative cancellation

pub mod context;
pub mod entity;
pub mod error;
pub mod identity;
pub mod key;
pub mod page;
pub mod status;

pub use context::RequestContext;
pub use entity::EntityType;
pub use error::TypeError;
pub use identity::{CampaignId, MasterId, MasterRef};
pub use key::{KeyClock, KEY_TIMESTAMP_FORMAT};
pub use page::{Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use status::{
    LifecycleStatus, OrderStatus, PaymentStatus, QuoteStatus, TransactionStatus, TransactionType,
};
