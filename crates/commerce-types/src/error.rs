use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("invalid uuid: {0}")]
    InvalidUuid(String),
}
