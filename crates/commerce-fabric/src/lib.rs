//! Event bus for the commerce core.
//!
//! Outbound notifications from the service layer and inbound command events
//! for the dispatcher both travel through an [`EventBus`]. Consumers depend
//! on the [`EventSource`] and [`EventSink`] traits rather than the bus.

pub mod bus;
pub mod error;
pub mod event;

pub use bus::{BusConfig, EventBus, EventFilter, EventSink, EventSource, EventStream};
pub use error::{FabricError, FabricResult};
pub use event::{BusEvent, EventPattern};
