//! Transaction propagation for RestDB.
//!
//! Nested units of work share, create, or partially isolate database
//! transactions according to a [`Propagation`] policy. The active
//! transaction travels through the [`Carrier`](crate::carrier::Carrier) as
//! a [`TxBinding`]; the engine decides per call frame whether it owns the
//! physical transaction, owns a savepoint nested inside it, or merely
//! borrows the handle - and owners alone perform the single close
//! operation (commit, rollback, release, or rollback-to-savepoint).
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//!
//! use restdb::driver::{MemoryDatabase, MemoryTransaction};
//! use restdb::transaction::{run, run_with_propagation, with_database, Propagation};
//! use restdb::{Carrier, TransactionError, TransactionResult};
//!
//! # fn main() -> TransactionResult<()> {
//! let db = MemoryDatabase::new();
//! let carrier = with_database(&Carrier::new(), Arc::new(db.clone()));
//!
//! run(&carrier, |carrier, tx: &MemoryTransaction| {
//!     tx.insert("todos", serde_json::json!({ "text": "a" }))?;
//!     // a failing savepoint frame discards only its own writes
//!     let _: TransactionResult<()> =
//!         run_with_propagation(carrier, Propagation::Savepoint, |_, tx: &MemoryTransaction| {
//!             tx.insert("todos", serde_json::json!({ "text": "b" }))?;
//!             Err(TransactionError::work("validation failed"))
//!         });
//!     Ok(())
//! })?;
//!
//! assert_eq!(db.row_count("todos"), 1);
//! # Ok(())
//! # }
//! ```

mod binding;
mod engine;
mod error;
mod propagation;

pub use binding::{
    binding_of, database_of, with_database, ConnectionBinding, SavepointName, TxBinding,
};
pub use engine::{run, run_with_propagation};
pub use error::{SavepointPhase, TransactionError, TransactionResult};
pub use propagation::Propagation;
