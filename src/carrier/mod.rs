//! Request-scoped context carrier.
//!
//! A [`Carrier`] is an immutable, copy-on-extend key/value context threaded
//! explicitly through a call chain. It replaces the ambient, framework-owned
//! request context of declarative transaction managers: every call receives
//! the carrier as an argument and extends it for its callees, so there is no
//! hidden global state and sibling call trees cannot observe each other's
//! bindings.
//!
//! The transaction layer stores two values in the carrier: the
//! connection-level binding (where new transactions come from) and the
//! active transaction binding of the current call chain. Both are attached
//! through helpers in [`crate::transaction`].

mod context;

pub use context::Carrier;
