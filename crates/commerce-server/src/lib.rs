//! Commerce core node.
//!
//! Wires the in-memory store, the event bus, the service facade, and the
//! command dispatcher together and exposes a small HTTP admin surface.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::NodeConfig;
pub use error::{ServerError, ServerResult};
pub use server::CommerceNode;
