//! Aggregate and optimistic-concurrency primitives.

use crate::error::{DomainError, DomainResult};

/// Minimal interface shared by stateful domain roots.
pub trait AggregateRoot {
    /// Strongly-typed identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the state.
    ///
    /// For the stock ledger this is the per-item stream version (number of
    /// movements applied); for orders it is the record revision. Either way
    /// it is the token checked by [`ExpectedVersion`] at write time.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation checked at append/update time.
///
/// The writer discipline for balances is "serialize writers per item": a
/// caller reads a version, decides, and writes expecting that version. A
/// concurrent writer that got there first makes the check fail with a
/// [`DomainError::Conflict`], which the executor retries once with fresh
/// state before surfacing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (replays, migrations).
    Any,
    /// Require the stream/record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "version check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }
}

/// Decision/evolution split for append-only state.
///
/// - `handle(&self, cmd)` validates against current state and returns the
///   facts to record; it never mutates.
/// - `apply(&mut self, fact)` evolves in-memory state from one recorded fact.
///
/// Implementations must be deterministic and free of IO, so that replaying
/// every recorded fact from an empty instance reproduces the current state
/// exactly.
pub trait Aggregate: AggregateRoot {
    type Command: Clone + core::fmt::Debug;
    type Event: Clone + core::fmt::Debug;
    type Error: core::fmt::Debug;

    /// Evolve in-memory state from a single recorded fact.
    fn apply(&mut self, event: &Self::Event);

    /// Decide which facts to record given current state and a command.
    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_version_mismatch_is_a_conflict() {
        let err = ExpectedVersion::Exact(3).check(4).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn any_matches_everything() {
        assert!(ExpectedVersion::Any.matches(0));
        assert!(ExpectedVersion::Any.matches(u64::MAX));
    }
}
