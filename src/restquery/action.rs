//! REST actions as a bitmask.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of REST actions.
///
/// Used both as the single action of a query and as a permission mask on a
/// resource, so the constants compose with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(u8);

impl Action {
    /// No action.
    pub const NONE: Action = Action(0);
    /// Read a resource or collection.
    pub const GET: Action = Action(1);
    /// Create a resource.
    pub const POST: Action = Action(1 << 1);
    /// Replace a resource.
    pub const PUT: Action = Action(1 << 2);
    /// Partially update a resource.
    pub const PATCH: Action = Action(1 << 3);
    /// Delete a resource.
    pub const DELETE: Action = Action(1 << 4);
    /// Every action.
    pub const ALL: Action = Action(0b1_1111);

    /// Check if every action in `other` is included in this set.
    pub fn contains(self, other: Action) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if this set allows no action at all.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Check if the set contains a write action.
    pub fn is_mutation(self) -> bool {
        self.0 & (Self::POST.0 | Self::PUT.0 | Self::PATCH.0 | Self::DELETE.0) != 0
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::NONE
    }
}

impl BitOr for Action {
    type Output = Action;

    fn bitor(self, rhs: Action) -> Action {
        Action(self.0 | rhs.0)
    }
}

impl BitOrAssign for Action {
    fn bitor_assign(&mut self, rhs: Action) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "none");
        }
        let mut names = Vec::new();
        for (mask, label) in [
            (Self::GET, "get"),
            (Self::POST, "post"),
            (Self::PUT, "put"),
            (Self::PATCH, "patch"),
            (Self::DELETE, "delete"),
        ] {
            if self.contains(mask) {
                names.push(label);
            }
        }
        write!(f, "{}", names.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_are_distinct() {
        let actions = [
            Action::GET,
            Action::POST,
            Action::PUT,
            Action::PATCH,
            Action::DELETE,
        ];
        for (i, a) in actions.iter().enumerate() {
            assert_ne!(*a, Action::NONE);
            assert_ne!(*a, Action::ALL);
            for b in &actions[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_all_is_union_of_actions() {
        assert_eq!(
            Action::ALL,
            Action::GET | Action::POST | Action::PUT | Action::PATCH | Action::DELETE
        );
    }

    #[test]
    fn test_contains() {
        let mask = Action::GET | Action::POST;
        assert!(mask.contains(Action::GET));
        assert!(mask.contains(Action::POST));
        assert!(!mask.contains(Action::DELETE));
        assert!(Action::ALL.contains(mask));
    }

    #[test]
    fn test_is_mutation() {
        assert!(!Action::GET.is_mutation());
        assert!(Action::POST.is_mutation());
        assert!((Action::GET | Action::DELETE).is_mutation());
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::NONE.to_string(), "none");
        assert_eq!(Action::GET.to_string(), "get");
        assert_eq!((Action::GET | Action::DELETE).to_string(), "get|delete");
    }
}
