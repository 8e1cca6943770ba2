use chrono::{DateTime, Utc};

/// A fact the clinic core announces to whoever listens.
///
/// Notices are immutable once published and carry a stable type name so
/// subscribers can route them without downcasting.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable type identifier (e.g. "inventory.reorder.raised").
    fn event_type(&self) -> &'static str;

    /// Schema version of the payload.
    fn version(&self) -> u32;

    /// Business time at which the fact became true.
    fn occurred_at(&self) -> DateTime<Utc>;
}
