//! Carrier bindings for connections and active transactions.
//!
//! Two values travel through the carrier: the connection-level
//! [`ConnectionBinding`] attached once per request before any transaction
//! exists, and the [`TxBinding`] describing the transaction a call chain is
//! currently inside of. Both are looked up by type, so rebinding for a
//! nested frame shadows the outer value without mutating it.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::carrier::Carrier;
use crate::driver::{Database, TransactionHandle};

/// A savepoint name, unique within its owning transaction.
///
/// Names come from a counter scoped to the physical transaction, not from
/// nesting depth, so savepoints created and released repeatedly at the same
/// depth never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SavepointName(String);

impl SavepointName {
    /// prefix for engine-generated savepoints
    pub const PREFIX: &'static str = "sp_";

    pub(crate) fn numbered(n: u32) -> Self {
        Self(format!("{}{}", Self::PREFIX, n))
    }

    /// get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// extract the counter value this name was generated from
    pub fn index(&self) -> Option<u32> {
        self.0.strip_prefix(Self::PREFIX)?.parse().ok()
    }
}

impl fmt::Display for SavepointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SavepointName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The active transaction of a call chain, as stored in the carrier.
///
/// The binding is bookkeeping around a shared handle: which physical
/// transaction is open, how deeply savepoints are nested, and the counter
/// that names the next savepoint. Work code receives the same handle at
/// every depth and cannot tell from the handle alone whether a savepoint
/// is open around it.
pub struct TxBinding<Tx> {
    handle: Arc<Tx>,
    tx_id: String,
    depth: u32,
    savepoints: Vec<SavepointName>,
    counter: Arc<AtomicU32>,
    started_at: DateTime<Utc>,
}

impl<Tx> Clone for TxBinding<Tx> {
    fn clone(&self) -> Self {
        Self {
            handle: Arc::clone(&self.handle),
            tx_id: self.tx_id.clone(),
            depth: self.depth,
            savepoints: self.savepoints.clone(),
            counter: Arc::clone(&self.counter),
            started_at: self.started_at,
        }
    }
}

impl<Tx: TransactionHandle> TxBinding<Tx> {
    /// Create the root binding for a freshly begun transaction.
    pub(crate) fn root(handle: Tx) -> Self {
        Self {
            handle: Arc::new(handle),
            tx_id: Ulid::new().to_string().to_lowercase(),
            depth: 0,
            savepoints: Vec::new(),
            counter: Arc::new(AtomicU32::new(0)),
            started_at: Utc::now(),
        }
    }

    /// Derive the binding seen inside a savepoint frame.
    pub(crate) fn nested(&self, savepoint: SavepointName) -> Self {
        let mut savepoints = self.savepoints.clone();
        savepoints.push(savepoint);
        Self {
            handle: Arc::clone(&self.handle),
            tx_id: self.tx_id.clone(),
            depth: self.depth + 1,
            savepoints,
            counter: Arc::clone(&self.counter),
            started_at: self.started_at,
        }
    }

    /// Reserve the next savepoint name of this transaction.
    pub(crate) fn next_savepoint(&self) -> SavepointName {
        SavepointName::numbered(self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Shared handle to the physical transaction.
    pub fn handle(&self) -> Arc<Tx> {
        Arc::clone(&self.handle)
    }

    /// Unique ID of the physical transaction.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Savepoint nesting depth of this frame (0 at the transaction root).
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Names of the savepoints enclosing this frame, outermost first.
    pub fn savepoints(&self) -> &[SavepointName] {
        &self.savepoints
    }

    /// When the physical transaction was begun.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl<Tx> fmt::Debug for TxBinding<Tx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxBinding")
            .field("tx_id", &self.tx_id)
            .field("depth", &self.depth)
            .field("savepoints", &self.savepoints)
            .finish()
    }
}

/// Connection-level carrier value: where new transactions come from.
pub struct ConnectionBinding<Tx> {
    database: Arc<dyn Database<Tx = Tx>>,
}

impl<Tx> Clone for ConnectionBinding<Tx> {
    fn clone(&self) -> Self {
        Self {
            database: Arc::clone(&self.database),
        }
    }
}

/// Attach a database connection to a carrier, before any transaction exists.
pub fn with_database<D>(carrier: &Carrier, database: Arc<D>) -> Carrier
where
    D: Database,
{
    let database: Arc<dyn Database<Tx = D::Tx>> = database;
    carrier.with_value(ConnectionBinding { database })
}

/// Look up the database connection bound to a carrier.
pub fn database_of<Tx>(carrier: &Carrier) -> Option<Arc<dyn Database<Tx = Tx>>>
where
    Tx: TransactionHandle,
{
    carrier
        .get::<ConnectionBinding<Tx>>()
        .map(|binding| Arc::clone(&binding.database))
}

/// Look up the active transaction binding of a carrier.
pub fn binding_of<Tx>(carrier: &Carrier) -> Option<&TxBinding<Tx>>
where
    Tx: TransactionHandle,
{
    carrier.get::<TxBinding<Tx>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{MemoryDatabase, MemoryTransaction};

    #[test]
    fn test_savepoint_name_format() {
        let name = SavepointName::numbered(3);
        assert_eq!(name.as_str(), "sp_3");
        assert_eq!(name.index(), Some(3));
        assert_eq!(name.to_string(), "sp_3");
    }

    #[test]
    fn test_root_binding() {
        let db = MemoryDatabase::new();
        let binding = TxBinding::root(db.begin_transaction().unwrap());

        assert_eq!(binding.depth(), 0);
        assert!(binding.savepoints().is_empty());
        assert_eq!(binding.tx_id().len(), 26); // ULID length
        binding.handle().rollback().unwrap();
    }

    #[test]
    fn test_nested_binding_shares_handle_and_counter() {
        let db = MemoryDatabase::new();
        let root = TxBinding::root(db.begin_transaction().unwrap());

        let first = root.next_savepoint();
        let nested = root.nested(first.clone());
        assert_eq!(nested.depth(), 1);
        assert_eq!(nested.savepoints(), &[first]);
        assert_eq!(nested.tx_id(), root.tx_id());
        assert!(Arc::ptr_eq(&root.handle(), &nested.handle()));

        // the counter is scoped to the transaction, not the frame
        assert_eq!(nested.next_savepoint(), SavepointName::numbered(2));
        assert_eq!(root.next_savepoint(), SavepointName::numbered(3));
        root.handle().rollback().unwrap();
    }

    #[test]
    fn test_database_binding_roundtrip() {
        let carrier = Carrier::new();
        assert!(database_of::<MemoryTransaction>(&carrier).is_none());

        let db = MemoryDatabase::new();
        let carrier = with_database(&carrier, Arc::new(db));
        let bound = database_of::<MemoryTransaction>(&carrier).unwrap();
        bound.begin_transaction().unwrap().rollback().unwrap();
    }

    #[test]
    fn test_binding_absent_by_default() {
        let carrier = Carrier::new();
        assert!(binding_of::<MemoryTransaction>(&carrier).is_none());
    }
}
