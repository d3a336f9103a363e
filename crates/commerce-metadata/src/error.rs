/// Errors produced by metadata encoding and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("metadata document is not a JSON object")]
    NotAnObject,

    #[error("metadata document is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    #[error("service_specific has {count} namespaces, limit is {max}")]
    TooManyNamespaces { count: usize, max: usize },

    #[error("invalid service_specific namespace: {0:?}")]
    InvalidNamespace(String),
}

pub type MetadataResult<T> = Result<T, MetadataError>;

impl From<serde_json::Error> for MetadataError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
