/// Errors produced by the event bus.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// A subscription pattern could not be parsed.
    #[error("invalid event pattern {0:?}")]
    InvalidPattern(String),

    /// The bus has been closed and cannot accept events or subscribers.
    #[error("event bus is shut down")]
    Shutdown,

    /// The sink could not deliver the event.
    #[error("event delivery failed: {0}")]
    Delivery(String),
}

/// Convenience alias used throughout the fabric crate.
pub type FabricResult<T> = std::result::Result<T, FabricError>;
