//! Persistence boundary errors.
//!
//! Store traits live next to the domain types they persist (see the
//! `clinic-*` domain crates). They all report failures with [`StoreError`],
//! which callers propagate rather than interpret.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a persistence adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or the query failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness, range or conditional-write constraint fired in a way
    /// the adapter could not map to a domain outcome. Nothing was written.
    #[error("store conflict: {0}")]
    Conflict(String),

    /// A persisted row could not be mapped back to a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Lock poisoning in an in-process store.
    pub fn poisoned() -> Self {
        Self::Unavailable("lock poisoned".to_string())
    }
}
