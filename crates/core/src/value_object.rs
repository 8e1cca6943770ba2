//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values compared by their contents.
///
/// Doctor names, slot labels and threshold snapshots are value objects: two
/// instances holding the same values are interchangeable. To "change" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
