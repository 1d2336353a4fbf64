use pocketledger_core::errors::StoreError;
use thiserror::Error;

/// Failures raised by the SQLite-backed cache.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Database connection failed: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Stored document is not valid JSON: {0}")]
    Serialization(String),
}

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(message) => StoreError::serialization(message),
            other => StoreError::backend(other.to_string()),
        }
    }
}
