//! CLI-specific error types
//!
//! Every CLI error ends the process. Table errors keep their own code.

use std::io;

use thiserror::Error;

use crate::errors::TableError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// stdin/stdout failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input line is not a JSON object
    #[error("invalid input on line {line}: {reason}")]
    InvalidInput { line: usize, reason: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl CliError {
    pub fn invalid_input(line: usize, reason: impl Into<String>) -> Self {
        CliError::InvalidInput {
            line,
            reason: reason.into(),
        }
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Io(_) => "ESFDW_CLI_IO_ERROR",
            CliError::InvalidInput { .. } => "ESFDW_CLI_INVALID_INPUT",
            CliError::Table(error) => error.code(),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            CliError::invalid_input(3, "not an object").code(),
            "ESFDW_CLI_INVALID_INPUT"
        );
        let table = CliError::from(TableError::missing_identity("id"));
        assert_eq!(table.code(), "ESFDW_MISSING_IDENTITY");
        assert_eq!(table.to_string(), TableError::missing_identity("id").to_string());
    }
}
