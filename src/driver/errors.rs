//! Driver error types.

use thiserror::Error;

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Typed failures surfaced by a database driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The transaction handle was already committed or rolled back.
    #[error("transaction is closed")]
    TransactionClosed,

    /// The named savepoint does not exist in this transaction.
    #[error("unknown savepoint: {0}")]
    UnknownSavepoint(String),

    /// A savepoint with this name already exists in this transaction.
    #[error("savepoint already exists: {0}")]
    SavepointExists(String),

    /// The connection to the database was lost or refused.
    #[error("connection error: {0}")]
    Connection(String),

    /// A statement failed to execute.
    #[error("sql error: {0}")]
    Sql(String),
}

impl DriverError {
    /// check if this error indicates misuse of a handle rather than an
    /// infrastructure fault
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            DriverError::TransactionClosed
                | DriverError::UnknownSavepoint(_)
                | DriverError::SavepointExists(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(DriverError::TransactionClosed.is_usage());
        assert!(DriverError::UnknownSavepoint("sp_1".to_string()).is_usage());
        assert!(!DriverError::Connection("refused".to_string()).is_usage());
    }
}
