//! REST query description model.
//!
//! A [`RestQuery`] describes what a client asked for: the action, the
//! target resource (optionally narrowed to a single key), paging,
//! projected fields, sort order, and an optional filter predicate. It is a
//! plain data and formatting utility handed to the REST layer; the
//! transaction engine never inspects it.

mod action;
mod query;

pub use action::Action;
pub use query::{Field, Filter, RestQuery, Sort};
