//! Table error types
//!
//! Error codes:
//! - ESFDW_INVALID_CONFIGURATION (FATAL at table open)
//! - ESFDW_MISSING_IDENTITY (FATAL for the single write)
//! - ESFDW_STORE_REQUEST_FAILED (ERROR, recoverable)

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Severity levels for table errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The operation failed but the table handle stays usable
    Error,
    /// The table (or the write statement) cannot proceed
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;

/// Errors raised while opening or operating on a foreign table
#[derive(Debug, Clone, Error)]
pub enum TableError {
    /// Malformed option value; the table cannot be opened
    #[error("Invalid configuration for '{key}': {reason}")]
    InvalidConfiguration { key: String, reason: String },

    /// Row has no identity column value, so no document can be targeted
    #[error("INSERT/UPDATE requires \"{column}\" column")]
    MissingIdentity { column: String },

    /// Transport or HTTP level failure talking to the store
    #[error("{operation} for {path} failed: {source}")]
    StoreRequestFailed {
        operation: &'static str,
        path: String,
        #[source]
        source: StoreError,
    },
}

impl TableError {
    pub fn invalid_configuration(key: impl Into<String>, reason: impl Into<String>) -> Self {
        TableError::InvalidConfiguration {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn missing_identity(column: impl Into<String>) -> Self {
        TableError::MissingIdentity {
            column: column.into(),
        }
    }

    pub fn store_request_failed(
        operation: &'static str,
        path: impl Into<String>,
        source: StoreError,
    ) -> Self {
        TableError::StoreRequestFailed {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TableError::InvalidConfiguration { .. } => "ESFDW_INVALID_CONFIGURATION",
            TableError::MissingIdentity { .. } => "ESFDW_MISSING_IDENTITY",
            TableError::StoreRequestFailed { .. } => "ESFDW_STORE_REQUEST_FAILED",
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        match self {
            TableError::InvalidConfiguration { .. } | TableError::MissingIdentity { .. } => {
                Severity::Fatal
            }
            TableError::StoreRequestFailed { .. } => Severity::Error,
        }
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
