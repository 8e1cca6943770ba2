//! Medication inventory and the automatic reorder engine.
//!
//! Threshold evaluation is pure. Stock changes and order creation go through
//! the store traits in [`store`] and [`clinic_purchasing::PurchaseOrderStore`],
//! whose implementations make every check-then-act step atomic.

pub mod medication;
pub mod notify;
pub mod service;
pub mod store;
pub mod thresholds;

pub use medication::{Medication, MedicationUpdate, NewMedication, MAX_QUANTITY};
pub use notify::{NoopNotifier, NotifyError, ReorderNotice, ReorderNotifier};
pub use service::{ConsumeReceipt, InventoryError, InventoryService, LowStockEntry, ReceivedOrder};
pub use store::{Decrease, InventoryStore, MedicationStore};
pub use thresholds::{PrescriptionPreview, StockAlert, ThresholdCheck};
