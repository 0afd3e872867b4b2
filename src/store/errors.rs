//! # Store Errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures talking to the document store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Connection, timeout or TLS failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request could not be built or was rejected before sending
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failure injected by a test store
    #[error("injected failure")]
    Injected,
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::Status {
            status: 404,
            body: what.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        assert!(matches!(
            StoreError::not_found("doc 7"),
            StoreError::Status { status: 404, .. }
        ));
        assert_eq!(StoreError::not_found("doc 7").to_string(), "HTTP 404: doc 7");
    }
}
