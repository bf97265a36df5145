//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic business failures only. Storage concerns are mapped into
/// this taxonomy at the infrastructure boundary and never leak their own
/// detail to callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (zero/negative quantity where positive is required,
    /// empty order line set, missing reason code, unparseable identifier).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced item, batch, order, line, or supplier does not exist.
    /// Carries the missing identifier.
    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent write collision (stale stream or record version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid lifecycle transition or a quantity beyond what the current
    /// state allows (over-receipt, dispense past available stock).
    #[error("invalid state: {0}")]
    State(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Conflicts are the only errors eligible for the single automatic
    /// retry at the ledger/order-manager boundary.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
