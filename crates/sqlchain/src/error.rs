//! Error types for sqlchain

use thiserror::Error;

/// Result type alias for sqlchain operations
pub type ChainResult<T> = Result<T, ChainError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum ChainError {
    /// Malformed clause input (join type, operator, sort direction, identifier, ...).
    ///
    /// Raised while the clause is being constructed; the statement must be fixed by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The accumulated statement cannot be executed (missing table, missing WHERE, ...).
    ///
    /// Raised by `exec()` before anything reaches the executor.
    #[error("Statement error: {0}")]
    Statement(String),

    /// Executor failure, propagated as-is
    #[error("Execution error: {0}")]
    Execution(String),

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Serialization error (array literals)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl ChainError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create a statement-state error
    pub fn statement(message: impl Into<String>) -> Self {
        Self::Statement(message.into())
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a statement-state error
    pub fn is_statement(&self) -> bool {
        matches!(self, Self::Statement(_))
    }

    /// Check if this error came from the executor
    pub fn is_execution(&self) -> bool {
        match self {
            Self::Execution(_) => true,
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => true,
            _ => false,
        }
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
