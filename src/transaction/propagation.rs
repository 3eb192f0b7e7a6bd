//! Transaction propagation policies.
//!
//! A policy decides how a unit of work relates to the transaction already
//! active in its carrier: join it, demand it, or nest a savepoint in it.

use std::fmt;

/// How a unit of work joins the ambient transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Propagation {
    /// Reuse the active transaction if one exists; otherwise begin a new
    /// one and own it to completion.
    #[default]
    Join,

    /// Require an active transaction. Running without one is a caller bug
    /// and fails before the unit of work is invoked.
    Mandatory,

    /// Nest a savepoint inside the active transaction, so a failure of
    /// this unit discards only its own writes while earlier writes of the
    /// enclosing transaction survive. Without an active transaction this
    /// behaves exactly like [`Propagation::Join`].
    Savepoint,
}

impl Propagation {
    /// Check if this policy refuses to create a transaction.
    pub fn requires_active(&self) -> bool {
        matches!(self, Propagation::Mandatory)
    }

    /// Get a human-readable description of this policy.
    pub fn description(&self) -> &'static str {
        match self {
            Propagation::Join => "join the active transaction, or begin and own a new one",
            Propagation::Mandatory => "require an active transaction, never begin one",
            Propagation::Savepoint => "nest a savepoint inside the active transaction",
        }
    }
}

impl fmt::Display for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Propagation::Join => write!(f, "join"),
            Propagation::Mandatory => write!(f, "mandatory"),
            Propagation::Savepoint => write!(f, "savepoint"),
        }
    }
}

impl std::str::FromStr for Propagation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "join" => Ok(Propagation::Join),
            "mandatory" => Ok(Propagation::Mandatory),
            "savepoint" => Ok(Propagation::Savepoint),
            _ => Err(format!("unknown propagation policy: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_propagation() {
        assert_eq!(Propagation::default(), Propagation::Join);
    }

    #[test]
    fn test_requires_active() {
        assert!(!Propagation::Join.requires_active());
        assert!(Propagation::Mandatory.requires_active());
        assert!(!Propagation::Savepoint.requires_active());
    }

    #[test]
    fn test_parse_propagation() {
        assert_eq!("join".parse::<Propagation>().unwrap(), Propagation::Join);
        assert_eq!("MANDATORY".parse::<Propagation>().unwrap(), Propagation::Mandatory);
        assert_eq!("Savepoint".parse::<Propagation>().unwrap(), Propagation::Savepoint);
        assert!("nested".parse::<Propagation>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for policy in [Propagation::Join, Propagation::Mandatory, Propagation::Savepoint] {
            assert_eq!(policy.to_string().parse::<Propagation>().unwrap(), policy);
        }
    }
}
