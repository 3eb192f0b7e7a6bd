//! In-memory reference driver.
//!
//! Rows are JSON values grouped by table name. Writes are staged inside the
//! transaction handle and merged into the shared tables on commit; savepoints
//! snapshot the staged state. The driver also counts commits and rollbacks so
//! tests can assert that exactly one close happens per physical transaction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::driver::errors::{DriverError, DriverResult};
use crate::driver::traits::{Database, TransactionHandle};

/// An in-memory database of JSON rows grouped by table.
///
/// Clone this to share it - it uses Arc internally.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    commits: AtomicU32,
    rollbacks: AtomicU32,
}

impl MemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows in a table.
    pub fn row_count(&self, table: &str) -> usize {
        self.inner.tables.read().get(table).map(Vec::len).unwrap_or(0)
    }

    /// Committed rows of a table.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.inner.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Names of tables holding at least one committed row.
    pub fn tables(&self) -> Vec<String> {
        self.inner.tables.read().keys().cloned().collect()
    }

    /// Number of transactions committed so far.
    pub fn commit_count(&self) -> u32 {
        self.inner.commits.load(Ordering::Relaxed)
    }

    /// Number of transactions rolled back so far.
    pub fn rollback_count(&self) -> u32 {
        self.inner.rollbacks.load(Ordering::Relaxed)
    }
}

impl Database for MemoryDatabase {
    type Tx = MemoryTransaction;

    fn begin_transaction(&self) -> DriverResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            state: Mutex::new(TxState::default()),
        })
    }
}

/// A transaction over a [`MemoryDatabase`].
pub struct MemoryTransaction {
    inner: Arc<MemoryInner>,
    state: Mutex<TxState>,
}

#[derive(Default)]
struct TxState {
    staged: HashMap<String, Vec<Value>>,
    savepoints: Vec<SavepointFrame>,
    closed: bool,
}

struct SavepointFrame {
    name: String,
    staged: HashMap<String, Vec<Value>>,
}

impl TxState {
    fn ensure_open(&self) -> DriverResult<()> {
        if self.closed {
            return Err(DriverError::TransactionClosed);
        }
        Ok(())
    }

    fn position_of(&self, name: &str) -> DriverResult<usize> {
        self.savepoints
            .iter()
            .position(|frame| frame.name == name)
            .ok_or_else(|| DriverError::UnknownSavepoint(name.to_string()))
    }
}

impl MemoryTransaction {
    /// Stage a row for insertion.
    pub fn insert(&self, table: &str, row: Value) -> DriverResult<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.staged.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    /// Rows visible inside this transaction: committed rows plus staged ones.
    pub fn rows(&self, table: &str) -> DriverResult<Vec<Value>> {
        let state = self.state.lock();
        state.ensure_open()?;
        let mut rows = self.inner.tables.read().get(table).cloned().unwrap_or_default();
        if let Some(staged) = state.staged.get(table) {
            rows.extend(staged.iter().cloned());
        }
        Ok(rows)
    }
}

impl TransactionHandle for MemoryTransaction {
    fn commit(&self) -> DriverResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.ensure_open()?;
        state.closed = true;
        let mut tables = self.inner.tables.write();
        for (table, rows) in state.staged.drain() {
            tables.entry(table).or_default().extend(rows);
        }
        self.inner.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn rollback(&self) -> DriverResult<()> {
        let mut state = self.state.lock();
        state.ensure_open()?;
        state.closed = true;
        state.staged.clear();
        state.savepoints.clear();
        self.inner.rollbacks.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn begin_savepoint(&self, name: &str) -> DriverResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.ensure_open()?;
        if state.savepoints.iter().any(|frame| frame.name == name) {
            return Err(DriverError::SavepointExists(name.to_string()));
        }
        let snapshot = state.staged.clone();
        state.savepoints.push(SavepointFrame {
            name: name.to_string(),
            staged: snapshot,
        });
        Ok(())
    }

    fn release_savepoint(&self, name: &str) -> DriverResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.ensure_open()?;
        let position = state.position_of(name)?;
        // changes stay staged; the savepoint and everything nested below it
        // are forgotten
        state.savepoints.truncate(position);
        Ok(())
    }

    fn rollback_to_savepoint(&self, name: &str) -> DriverResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.ensure_open()?;
        let position = state.position_of(name)?;
        state.staged = state.savepoints[position].staged.clone();
        // the savepoint itself stays defined, deeper ones are gone
        state.savepoints.truncate(position + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(text: &str) -> Value {
        json!({ "text": text })
    }

    #[test]
    fn test_staged_rows_invisible_until_commit() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();

        tx.insert("todos", row("a")).unwrap();
        assert_eq!(db.row_count("todos"), 0);
        assert_eq!(tx.rows("todos").unwrap().len(), 1);

        tx.commit().unwrap();
        assert_eq!(db.row_count("todos"), 1);
        assert_eq!(db.commit_count(), 1);
    }

    #[test]
    fn test_rollback_discards_staged_rows() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();

        tx.insert("todos", row("a")).unwrap();
        tx.rollback().unwrap();

        assert_eq!(db.row_count("todos"), 0);
        assert_eq!(db.rollback_count(), 1);
    }

    #[test]
    fn test_transaction_sees_committed_rows() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();
        tx.insert("todos", row("a")).unwrap();
        tx.commit().unwrap();

        let tx = db.begin_transaction().unwrap();
        tx.insert("todos", row("b")).unwrap();
        assert_eq!(tx.rows("todos").unwrap().len(), 2);
        tx.rollback().unwrap();
        assert_eq!(db.row_count("todos"), 1);
    }

    #[test]
    fn test_closed_handle_rejects_operations() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();
        tx.commit().unwrap();

        assert!(matches!(tx.commit(), Err(DriverError::TransactionClosed)));
        assert!(matches!(tx.rollback(), Err(DriverError::TransactionClosed)));
        assert!(matches!(
            tx.insert("todos", row("x")),
            Err(DriverError::TransactionClosed)
        ));
    }

    #[test]
    fn test_rollback_to_savepoint_restores_staged_state() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();

        tx.insert("todos", row("a")).unwrap();
        tx.begin_savepoint("sp_1").unwrap();
        tx.insert("todos", row("b")).unwrap();

        tx.rollback_to_savepoint("sp_1").unwrap();
        assert_eq!(tx.rows("todos").unwrap().len(), 1);

        // the savepoint survives a rollback-to and can be reused
        tx.insert("todos", row("c")).unwrap();
        tx.rollback_to_savepoint("sp_1").unwrap();
        assert_eq!(tx.rows("todos").unwrap().len(), 1);

        tx.commit().unwrap();
        assert_eq!(db.row_count("todos"), 1);
    }

    #[test]
    fn test_release_savepoint_keeps_changes() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();

        tx.insert("todos", row("a")).unwrap();
        tx.begin_savepoint("sp_1").unwrap();
        tx.insert("todos", row("b")).unwrap();
        tx.release_savepoint("sp_1").unwrap();

        assert!(matches!(
            tx.rollback_to_savepoint("sp_1"),
            Err(DriverError::UnknownSavepoint(_))
        ));

        tx.commit().unwrap();
        assert_eq!(db.row_count("todos"), 2);
    }

    #[test]
    fn test_release_drops_nested_savepoints() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();

        tx.begin_savepoint("sp_1").unwrap();
        tx.begin_savepoint("sp_2").unwrap();
        tx.release_savepoint("sp_1").unwrap();

        assert!(matches!(
            tx.rollback_to_savepoint("sp_2"),
            Err(DriverError::UnknownSavepoint(_))
        ));
        tx.rollback().unwrap();
    }

    #[test]
    fn test_duplicate_savepoint_name_rejected() {
        let db = MemoryDatabase::new();
        let tx = db.begin_transaction().unwrap();

        tx.begin_savepoint("sp_1").unwrap();
        assert!(matches!(
            tx.begin_savepoint("sp_1"),
            Err(DriverError::SavepointExists(_))
        ));
        tx.rollback().unwrap();
    }
}
