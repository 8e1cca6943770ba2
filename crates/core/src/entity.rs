//! Entity trait: records that keep their identity across updates.

/// Entity marker + minimal interface.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
