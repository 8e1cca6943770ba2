//! Purchasing: replenishment orders raised by the reorder engine.
//!
//! The status lifecycle is pure domain logic. The "one pending order per
//! medication" rule is enforced by [`PurchaseOrderStore::insert_or_increase_pending`],
//! which stores implement as a single atomic operation.

pub mod order;
pub mod service;

pub use order::{PurchaseOrder, PurchaseOrderStatus, PurchaseOrderStore};
pub use service::{PurchasingError, PurchasingService};
