use commerce_metadata::MetadataError;
use commerce_types::EntityType;

/// Coarse classification of store failures.
///
/// Callers branch on this instead of matching individual variants: a
/// missing row and a broken connection are different failure classes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    Cancelled,
    Internal,
}

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Missing or malformed input, detected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A read or update matched zero rows.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The master index already holds a live row for this key.
    #[error("master entity already exists for {entity_type}:{business_key}")]
    Conflict {
        entity_type: EntityType,
        business_key: String,
    },

    /// A domain table already holds a row with this primary key.
    #[error("duplicate key {key} in {table}")]
    DuplicateKey { table: &'static str, key: String },

    /// A conditional status update found the row in another status.
    #[error("{entity} {key} is {actual}, expected {expected}")]
    StatusChanged {
        entity: &'static str,
        key: String,
        expected: String,
        actual: String,
    },

    /// The ambient request was cancelled; the transaction rolled back.
    #[error("request cancelled")]
    Cancelled,

    /// Metadata could not be encoded for storage.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::StatusChanged { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } | Self::DuplicateKey { .. } => ErrorKind::Conflict,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Metadata(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
