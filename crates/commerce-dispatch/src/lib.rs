//! Command dispatcher for the commerce core.
//!
//! Inbound events typed `<resource>.<action>` are routed through a
//! [`HandlerRegistry`] built at startup. Each resource handler decodes the
//! event payload into a typed request and calls the
//! [`CommerceService`](commerce_service::CommerceService).

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod outcome;
pub mod route;

pub use config::DispatchConfig;
pub use dispatcher::{Dispatcher, DISPATCH_ACTOR};
pub use error::{DispatchError, DispatchResult};
pub use handler::{HandlerRegistry, ResourceHandler};
pub use outcome::{DispatchOutcome, DispatchStats, DispatchStatsSnapshot};
pub use route::Route;
