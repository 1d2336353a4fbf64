//! Error types shared across the sync engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Mutation kinds used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Update,
    Delete,
}

impl WriteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOp::Update => "update",
            WriteOp::Delete => "delete",
        }
    }
}

impl std::fmt::Display for WriteOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the sync engine to its callers.
#[derive(Debug, Error)]
pub enum Error {
    /// Durable cache failure
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// Remote store failure with no offline fallback
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Mutation of a remote-confirmed record attempted while offline
    #[error("Cannot {op} {entity} '{id}' while offline: changes to synced records need a connection")]
    OfflineWrite {
        entity: &'static str,
        id: String,
        op: WriteOp,
    },

    /// Record not present in the local collection
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an offline-write error for a confirmed record.
    pub fn offline_write(entity: &'static str, id: impl Into<String>, op: WriteOp) -> Self {
        Self::OfflineWrite {
            entity,
            id: id.into(),
            op,
        }
    }

    /// Create a not-found error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Errors reported by the local durable cache.
///
/// These are recoverable by design: callers log them and treat the failed
/// write as a no-op.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage backend failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored document could not be serialized
    #[error("Storage serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }
}

/// Retry policy class for remote store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Errors reported by the remote store client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure (connection refused, timeout, DNS)
    #[error("Remote store unreachable: {0}")]
    Unavailable(String),

    /// The remote accepted the connection but rejected the request
    #[error("Remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Missing or invalid ambient credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Response body did not match the expected shape
    #[error("Malformed remote response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Create an unavailable error from a transport failure.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a rejected error from status and message.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create an auth error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// HTTP status if the remote produced one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Rejected { status, .. } => classify_http_status(*status),
            Self::Unavailable(_) => RetryClass::Retryable,
            Self::Auth(_) => RetryClass::ReauthRequired,
            Self::Malformed(_) => RetryClass::Permanent,
        }
    }
}

/// Map an HTTP status to a retry class.
pub fn classify_http_status(status: u16) -> RetryClass {
    match status {
        401 | 403 => RetryClass::ReauthRequired,
        408 | 409 | 423 | 425 | 429 => RetryClass::Retryable,
        500..=599 => RetryClass::Retryable,
        _ => RetryClass::Permanent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_class_for_auth_status_is_reauth() {
        let err = RemoteError::rejected(401, "unauthorized");
        assert_eq!(err.retry_class(), RetryClass::ReauthRequired);
    }

    #[test]
    fn retry_class_for_server_errors_is_retryable() {
        for status in [500, 502, 503, 599] {
            assert_eq!(classify_http_status(status), RetryClass::Retryable);
        }
    }

    #[test]
    fn retry_class_for_validation_status_is_permanent() {
        let err = RemoteError::rejected(422, "amount must be positive");
        assert_eq!(err.retry_class(), RetryClass::Permanent);
    }

    #[test]
    fn transport_failures_are_retryable() {
        let err = RemoteError::unavailable("connection refused");
        assert_eq!(err.retry_class(), RetryClass::Retryable);
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn offline_write_mentions_operation_and_id() {
        let err = Error::offline_write("transaction", "abc-123", WriteOp::Delete);
        let message = err.to_string();
        assert!(message.contains("delete"));
        assert!(message.contains("abc-123"));
    }
}
