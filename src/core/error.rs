use crate::core::Collection;
use crate::storage::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No data to update")]
    NoFieldsToUpdate,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Store error at {collection}: {source}")]
    Store {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error("Batch write to {collection} processed {processed} of {expected} records")]
    PartialBatch {
        collection: Collection,
        processed: usize,
        expected: usize,
    },

    #[error("Write errors at {collection}: {}", .messages.join(" & "))]
    MultiWrite {
        collection: Collection,
        messages: Vec<String>,
    },

    #[error("Key allocation for {collection} exhausted after {attempts} attempts")]
    AllocationExhausted { collection: Collection, attempts: u32 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Wraps a backend failure, tagging the collection it came from.
    pub fn store(collection: Collection, source: StoreError) -> Self {
        Self::Store { collection, source }
    }

    /// Collection the failure originated from, when one is known.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            Self::Store { collection, .. }
            | Self::PartialBatch { collection, .. }
            | Self::MultiWrite { collection, .. }
            | Self::AllocationExhausted { collection, .. } => Some(*collection),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for LedgerError {
    fn from(err: bcrypt::BcryptError) -> Self {
        LedgerError::Internal(format!("password hashing failed: {err}"))
    }
}

/// Extension for attaching the collection tag to raw store results.
pub trait StoreResultExt<T> {
    fn at(self, collection: Collection) -> Result<T>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, StoreError> {
    fn at(self, collection: Collection) -> Result<T> {
        self.map_err(|source| LedgerError::store(collection, source))
    }
}
