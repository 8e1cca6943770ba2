//! Domain error model.

use thiserror::Error;

/// Result type used by entity validation and pure domain rules.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic business failure.
///
/// Raised by validation and rule checks only. Storage failures are
/// [`StoreError`](crate::StoreError) and never end up in here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed validation (blank required field, negative threshold, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A rule that must always hold was broken.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier did not parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("not found")]
    NotFound,

    /// The request collides with existing state (slot taken, status moved).
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

/// Reject a blank (empty or whitespace-only) required field.
pub fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}
