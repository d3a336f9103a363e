use tracing::error;

use commerce_metadata::MetadataError;
use commerce_store::{ErrorKind, StoreError};

/// Client-visible failures of the service facade.
///
/// Anything that is not the caller's fault collapses into [`Internal`]; the
/// underlying cause is logged when the conversion happens and is not carried
/// in the message.
///
/// [`Internal`]: ServiceError::Internal
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error")]
    Internal,
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::InvalidArgument => Self::InvalidArgument(err.to_string()),
            _ => {
                error!(error = %err, kind = ?err.kind(), "store operation failed");
                Self::Internal
            }
        }
    }
}

impl From<MetadataError> for ServiceError {
    fn from(err: MetadataError) -> Self {
        Self::InvalidArgument(format!("invalid metadata: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_stays_visible() {
        let err: ServiceError = StoreError::not_found("order", "o1").into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: order not found: o1");
    }

    #[test]
    fn other_store_failures_become_opaque() {
        let err: ServiceError = StoreError::Internal("disk on fire".into()).into();
        assert!(matches!(err, ServiceError::Internal));
        assert_eq!(err.to_string(), "internal error");

        let err: ServiceError = StoreError::Cancelled.into();
        assert!(matches!(err, ServiceError::Internal));
    }

    #[test]
    fn metadata_violations_are_invalid_arguments() {
        let err: ServiceError = MetadataError::TooLarge { size: 70_000, max: 65_536 }.into();
        assert!(err.is_invalid_argument());
    }
}
