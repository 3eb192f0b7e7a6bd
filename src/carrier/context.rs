//! The carrier value chain.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// An immutable, copy-on-extend context passed through a call chain.
///
/// Values are keyed by their Rust type: [`Carrier::with_value`] stores one
/// value per type, and the newest value shadows older ones for the subtree
/// that sees the extended carrier. Extension never mutates the parent, and
/// cloning a carrier is a cheap pointer copy, so a carrier can be handed to
/// nested calls freely while the caller keeps its own view.
#[derive(Clone, Default)]
pub struct Carrier {
    head: Option<Arc<Node>>,
}

struct Node {
    parent: Option<Arc<Node>>,
    key: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

impl Carrier {
    /// Create an empty carrier.
    pub fn new() -> Self {
        Self { head: None }
    }

    /// Extend the carrier with a value, returning the extended copy.
    ///
    /// The receiver is left untouched; callers that hold it keep seeing
    /// the previous value for `V`, if any.
    pub fn with_value<V>(&self, value: V) -> Carrier
    where
        V: Clone + Send + Sync + 'static,
    {
        Carrier {
            head: Some(Arc::new(Node {
                parent: self.head.clone(),
                key: TypeId::of::<V>(),
                type_name: std::any::type_name::<V>(),
                value: Box::new(value),
            })),
        }
    }

    /// Look up the innermost value of type `V`.
    pub fn get<V>(&self) -> Option<&V>
    where
        V: Send + Sync + 'static,
    {
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            if current.key == TypeId::of::<V>() {
                return current.value.downcast_ref::<V>();
            }
            node = current.parent.as_deref();
        }
        None
    }

    /// Check whether a value of type `V` is bound.
    pub fn contains<V>(&self) -> bool
    where
        V: Send + Sync + 'static,
    {
        self.get::<V>().is_some()
    }
}

impl fmt::Debug for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            names.push(current.type_name);
            node = current.parent.as_deref();
        }
        f.debug_struct("Carrier").field("values", &names).finish()
    }
}
