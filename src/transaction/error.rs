//! Transaction engine error types.

use std::fmt;

use thiserror::Error;

use crate::driver::DriverError;
use crate::transaction::binding::SavepointName;
use crate::transaction::propagation::Propagation;

/// Result type for engine operations and units of work.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Phase of a savepoint's lifecycle in which a driver call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavepointPhase {
    /// Creating the savepoint.
    Begin,
    /// Releasing it after success.
    Release,
    /// Rolling back to it after failure.
    Rollback,
}

impl fmt::Display for SavepointPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SavepointPhase::Begin => write!(f, "begin"),
            SavepointPhase::Release => write!(f, "release"),
            SavepointPhase::Rollback => write!(f, "rollback"),
        }
    }
}

/// Errors surfaced by the propagation engine.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// A policy demanded an active transaction and the carrier had none.
    #[error("no active transaction ({0} propagation requires one)")]
    NoActiveTransaction(Propagation),

    /// No database connection is bound to the carrier.
    #[error("no database connection bound to carrier")]
    NoConnection,

    /// The driver failed to begin a transaction.
    #[error("begin failed: {0}")]
    Begin(#[source] DriverError),

    /// The driver failed to commit the owned transaction.
    #[error("commit failed: {0}")]
    Commit(#[source] DriverError),

    /// The driver failed to roll the owned transaction back.
    #[error("rollback failed: {0}")]
    Rollback(#[source] DriverError),

    /// A savepoint operation failed, tagged with the lifecycle phase.
    #[error("savepoint {name} {phase} failed: {source}")]
    Savepoint {
        name: SavepointName,
        phase: SavepointPhase,
        #[source]
        source: DriverError,
    },

    /// A unit of work failed inside a savepoint frame and its writes were
    /// already discarded by rolling back to the savepoint; the enclosing
    /// transaction was left open. An owner frame that receives this error
    /// unchanged closes its resource on the success path (the failure was
    /// compensated) while the error keeps propagating.
    #[error("rolled back to savepoint {name}: {source}")]
    SavepointRolledBack {
        name: SavepointName,
        #[source]
        source: Box<TransactionError>,
    },

    /// The unit of work failed and the owner's close operation failed too.
    /// Both are reported; dropping the close failure would hide a data
    /// corruption risk.
    #[error("{cause}; {close}")]
    DoubleFailure {
        cause: Box<TransactionError>,
        close: Box<TransactionError>,
    },

    /// Business-logic failure reported by a unit of work.
    #[error("{0}")]
    Work(String),

    /// Raw driver failure from a unit of work's own statements.
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl TransactionError {
    /// Business-logic failure with a message.
    pub fn work(message: impl Into<String>) -> Self {
        Self::Work(message.into())
    }

    pub(crate) fn double(cause: TransactionError, close: TransactionError) -> Self {
        Self::DoubleFailure {
            cause: Box::new(cause),
            close: Box::new(close),
        }
    }

    /// Check if this error reports a propagation policy violation.
    pub fn is_policy_violation(&self) -> bool {
        matches!(
            self,
            TransactionError::NoActiveTransaction(_) | TransactionError::NoConnection
        )
    }

    /// Check if this error came from the database infrastructure rather
    /// than from business logic.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            TransactionError::Begin(_)
                | TransactionError::Commit(_)
                | TransactionError::Rollback(_)
                | TransactionError::Savepoint { .. }
                | TransactionError::Driver(_)
        )
    }

    /// Check if the failure was already contained by a savepoint rollback,
    /// leaving the enclosing transaction intact.
    pub fn is_contained(&self) -> bool {
        matches!(self, TransactionError::SavepointRolledBack { .. })
    }
}
