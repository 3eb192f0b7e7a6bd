//! The propagation engine.
//!
//! [`run_with_propagation`] decides, from the carrier and the policy,
//! whether a unit of work joins an existing transaction, begins and owns a
//! new one, or owns a savepoint nested in the current one - and therefore
//! which frame performs the single close operation for each resource.
//! Ownership is assigned exactly once, when the resource is created, so no
//! transaction or savepoint is ever closed twice regardless of nesting.

use std::cell::Cell;
use std::sync::Arc;

use tracing::{debug, error, trace};

use crate::carrier::Carrier;
use crate::driver::TransactionHandle;
use crate::transaction::binding::{binding_of, database_of, SavepointName, TxBinding};
use crate::transaction::error::{SavepointPhase, TransactionError, TransactionResult};
use crate::transaction::propagation::Propagation;

/// Run a unit of work under the default [`Propagation::Join`] policy.
pub fn run<Tx, T, F>(carrier: &Carrier, work: F) -> TransactionResult<T>
where
    Tx: TransactionHandle,
    F: FnOnce(&Carrier, &Tx) -> TransactionResult<T>,
{
    run_with_propagation(carrier, Propagation::default(), work)
}

/// Run a unit of work under an explicit propagation policy.
///
/// The closure receives the carrier it must pass to nested calls and a
/// handle to the active transaction. The handle is the same object at
/// every nesting depth; only the frame that created a transaction or a
/// savepoint closes it, every other frame borrows.
pub fn run_with_propagation<Tx, T, F>(
    carrier: &Carrier,
    propagation: Propagation,
    work: F,
) -> TransactionResult<T>
where
    Tx: TransactionHandle,
    F: FnOnce(&Carrier, &Tx) -> TransactionResult<T>,
{
    match (binding_of::<Tx>(carrier), propagation) {
        (None, Propagation::Mandatory) => Err(TransactionError::NoActiveTransaction(propagation)),
        (None, _) => {
            let database = database_of::<Tx>(carrier).ok_or(TransactionError::NoConnection)?;
            let handle = database.begin_transaction().map_err(TransactionError::Begin)?;
            let binding = TxBinding::root(handle);
            debug!(tx_id = %binding.tx_id(), %propagation, "began transaction");
            let tx_id = binding.tx_id().to_string();
            let handle = binding.handle();
            let scoped = carrier.with_value(binding);
            close_owned(Owner::Transaction { tx_id }, handle, &scoped, work)
        }
        (Some(binding), Propagation::Savepoint) => {
            let name = binding.next_savepoint();
            let handle = binding.handle();
            handle
                .begin_savepoint(name.as_str())
                .map_err(|source| TransactionError::Savepoint {
                    name: name.clone(),
                    phase: SavepointPhase::Begin,
                    source,
                })?;
            debug!(
                tx_id = %binding.tx_id(),
                savepoint = %name,
                depth = binding.depth() + 1,
                "created savepoint"
            );
            let scoped = carrier.with_value(binding.nested(name.clone()));
            close_owned(Owner::Savepoint { name }, handle, &scoped, work)
        }
        (Some(binding), _) => {
            // Join or Mandatory over an existing transaction: borrow the
            // handle, never close it. The carrier passes through unchanged.
            trace!(tx_id = %binding.tx_id(), %propagation, "joined existing transaction");
            work(carrier, &binding.handle())
        }
    }
}

/// What an owning frame is responsible for closing.
enum Owner {
    Transaction { tx_id: String },
    Savepoint { name: SavepointName },
}

/// Run the work of an owning frame and perform its single close operation.
///
/// A failure already contained by a deeper savepoint rollback takes the
/// success-path close (commit or release): the enclosing transaction's
/// earlier writes survive while the error keeps propagating. Any other
/// failure takes the rollback path. If the close itself fails too, both
/// errors are reported.
fn close_owned<Tx, T, F>(
    owner: Owner,
    handle: Arc<Tx>,
    scoped: &Carrier,
    work: F,
) -> TransactionResult<T>
where
    Tx: TransactionHandle,
    F: FnOnce(&Carrier, &Tx) -> TransactionResult<T>,
{
    let result = {
        let guard = RollbackGuard::arm(handle.as_ref(), &owner);
        let result = work(scoped, &handle);
        guard.disarm();
        result
    };

    match owner {
        Owner::Transaction { tx_id } => match result {
            Ok(value) => {
                handle.commit().map_err(TransactionError::Commit)?;
                debug!(%tx_id, "committed transaction");
                Ok(value)
            }
            Err(contained) if contained.is_contained() => match handle.commit() {
                Ok(()) => {
                    debug!(%tx_id, "committed transaction with contained savepoint failure");
                    Err(contained)
                }
                Err(source) => Err(TransactionError::double(
                    contained,
                    TransactionError::Commit(source),
                )),
            },
            Err(cause) => match handle.rollback() {
                Ok(()) => {
                    debug!(%tx_id, "rolled back transaction");
                    Err(cause)
                }
                Err(source) => Err(TransactionError::double(
                    cause,
                    TransactionError::Rollback(source),
                )),
            },
        },
        Owner::Savepoint { name } => match result {
            Ok(value) => {
                handle
                    .release_savepoint(name.as_str())
                    .map_err(|source| TransactionError::Savepoint {
                        name: name.clone(),
                        phase: SavepointPhase::Release,
                        source,
                    })?;
                trace!(savepoint = %name, "released savepoint");
                Ok(value)
            }
            Err(contained) if contained.is_contained() => {
                match handle.release_savepoint(name.as_str()) {
                    Ok(()) => {
                        trace!(savepoint = %name, "released savepoint with contained failure");
                        Err(contained)
                    }
                    Err(source) => Err(TransactionError::double(
                        contained,
                        TransactionError::Savepoint {
                            name,
                            phase: SavepointPhase::Release,
                            source,
                        },
                    )),
                }
            }
            Err(cause) => match handle.rollback_to_savepoint(name.as_str()) {
                Ok(()) => {
                    debug!(savepoint = %name, "rolled back to savepoint");
                    Err(TransactionError::SavepointRolledBack {
                        name,
                        source: Box::new(cause),
                    })
                }
                Err(source) => Err(TransactionError::double(
                    cause,
                    TransactionError::Savepoint {
                        name,
                        phase: SavepointPhase::Rollback,
                        source,
                    },
                )),
            },
        },
    }
}

/// Rollback-on-unwind guard for owning frames.
///
/// Armed around the unit of work so a panic still closes the owned resource
/// (whole transaction or savepoint) before unwinding continues. Disarmed on
/// normal return; the close table in [`close_owned`] then decides
/// explicitly.
struct RollbackGuard<'a, Tx: TransactionHandle> {
    handle: &'a Tx,
    owner: &'a Owner,
    armed: Cell<bool>,
}

impl<'a, Tx: TransactionHandle> RollbackGuard<'a, Tx> {
    fn arm(handle: &'a Tx, owner: &'a Owner) -> Self {
        Self {
            handle,
            owner,
            armed: Cell::new(true),
        }
    }

    fn disarm(&self) {
        self.armed.set(false);
    }
}

impl<Tx: TransactionHandle> Drop for RollbackGuard<'_, Tx> {
    fn drop(&mut self) {
        if !self.armed.get() {
            return;
        }
        let outcome = match self.owner {
            Owner::Transaction { .. } => self.handle.rollback(),
            Owner::Savepoint { name } => self.handle.rollback_to_savepoint(name.as_str()),
        };
        if let Err(err) = outcome {
            error!(%err, "rollback during unwind failed");
        }
    }
}
