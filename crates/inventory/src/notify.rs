//! Reorder notification seam.
//!
//! Notification is best-effort: the reorder engine logs a failed delivery
//! and carries on. Concrete notifiers live in `clinic-infra`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clinic_core::{MedicationId, PurchaseOrderId};
use clinic_events::Event;

use crate::medication::Medication;

/// Raised when a prescription pushes stock below the reorder point and a
/// purchase order was created or topped up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderNotice {
    pub purchase_order_id: PurchaseOrderId,
    pub medication_id: MedicationId,
    pub medication_name: String,
    pub sku: String,
    /// Stock left after the prescription that triggered the order.
    pub after_stock: i64,
    pub reorder_quantity: i64,
    pub reorder_point: i64,
    pub minimum_stock: i64,
    pub raised_at: DateTime<Utc>,
}

impl ReorderNotice {
    pub fn new(
        medication: &Medication,
        purchase_order_id: PurchaseOrderId,
        after_stock: i64,
        raised_at: DateTime<Utc>,
    ) -> Self {
        Self {
            purchase_order_id,
            medication_id: medication.id,
            medication_name: medication.name.clone(),
            sku: medication.sku.clone(),
            after_stock,
            reorder_quantity: medication.reorder_quantity,
            reorder_point: medication.reorder_point,
            minimum_stock: medication.minimum_stock,
            raised_at,
        }
    }

    /// One-line subject, e.g. for a mail or chat message.
    pub fn subject(&self) -> String {
        format!(
            "Automatic reorder raised: {} (PO {})",
            self.medication_name, self.purchase_order_id
        )
    }
}

impl Event for ReorderNotice {
    fn event_type(&self) -> &'static str {
        "inventory.reorder.raised"
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.raised_at
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The notifier is not configured (missing endpoint or credentials).
    #[error("notifier not configured: {0}")]
    NotConfigured(String),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

pub trait ReorderNotifier: Send + Sync {
    fn notify(&self, notice: &ReorderNotice) -> Result<(), NotifyError>;
}

impl<N> ReorderNotifier for Arc<N>
where
    N: ReorderNotifier + ?Sized,
{
    fn notify(&self, notice: &ReorderNotice) -> Result<(), NotifyError> {
        (**self).notify(notice)
    }
}

/// Drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl ReorderNotifier for NoopNotifier {
    fn notify(&self, _notice: &ReorderNotice) -> Result<(), NotifyError> {
        Ok(())
    }
}
