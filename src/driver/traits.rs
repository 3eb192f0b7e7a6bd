//! Driver trait seam.

use crate::driver::errors::DriverResult;

/// A source of physical database transactions.
///
/// Implementations are connection-level objects (a pool, a single
/// connection, an embedded store) attached to the carrier once per request,
/// before any transaction exists.
pub trait Database: Send + Sync + 'static {
    /// The transaction handle type produced by this driver.
    type Tx: TransactionHandle;

    /// Begin a new physical transaction.
    fn begin_transaction(&self) -> DriverResult<Self::Tx>;
}

/// Handle to one physical database transaction.
///
/// A handle is shared between the frame that began the transaction and any
/// nested frames borrowing it through the carrier, so every operation takes
/// `&self` and drivers guard their internal state. A handle must reject all
/// operations after the first successful commit or rollback.
pub trait TransactionHandle: Send + Sync + 'static {
    /// Commit the transaction.
    fn commit(&self) -> DriverResult<()>;

    /// Roll the transaction back, discarding all uncommitted changes.
    fn rollback(&self) -> DriverResult<()>;

    /// Create a named savepoint inside the open transaction.
    fn begin_savepoint(&self, name: &str) -> DriverResult<()>;

    /// Release a savepoint, keeping its changes in the transaction.
    ///
    /// Savepoints nested below the released one are forgotten with it.
    fn release_savepoint(&self, name: &str) -> DriverResult<()>;

    /// Roll back to a savepoint, discarding changes made after it.
    ///
    /// The savepoint itself stays defined, matching SQL semantics.
    fn rollback_to_savepoint(&self, name: &str) -> DriverResult<()>;
}
