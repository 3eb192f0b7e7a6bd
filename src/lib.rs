//! RestDB - Transaction Propagation for REST-backed Services
//!
//! This crate provides the transaction layer of a REST-to-SQL gateway:
//! nested units of work share, create, or partially isolate database
//! transactions according to a declared [`Propagation`] policy. The active
//! transaction travels through an explicit [`Carrier`] context instead of
//! a hidden global, so the same business logic runs unchanged at any
//! nesting depth.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use restdb::driver::{MemoryDatabase, MemoryTransaction};
//! use restdb::{run, with_database, Carrier};
//!
//! let db = MemoryDatabase::new();
//! let carrier = with_database(&Carrier::new(), Arc::new(db.clone()));
//!
//! run(&carrier, |_carrier, tx: &MemoryTransaction| {
//!     tx.insert("todos", serde_json::json!({ "text": "write docs" }))?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! assert_eq!(db.row_count("todos"), 1);
//! ```

pub mod carrier;
pub mod driver;
pub mod restquery;
pub mod transaction;

pub use carrier::Carrier;
pub use driver::{Database, DriverError, DriverResult, TransactionHandle};
pub use transaction::{
    binding_of, database_of, run, run_with_propagation, with_database, Propagation,
    SavepointName, TransactionError, TransactionResult, TxBinding,
};
