use thiserror::Error;

use commerce_fabric::FabricError;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("subscription for resource {resource} failed: {source}")]
    Subscribe {
        resource: &'static str,
        #[source]
        source: FabricError,
    },
}

pub type DispatchResult<T> = Result<T, DispatchError>;
