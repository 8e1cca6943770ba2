use thiserror::Error;

use clinic_core::{DomainError, MedicationId, PurchaseOrderId, StoreError};

use crate::order::{PurchaseOrder, PurchaseOrderStatus, PurchaseOrderStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PurchasingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lookup and status management for purchase orders.
#[derive(Debug, Clone)]
pub struct PurchasingService<P> {
    orders: P,
}

impl<P> PurchasingService<P>
where
    P: PurchaseOrderStore,
{
    pub fn new(orders: P) -> Self {
        Self { orders }
    }

    pub fn order(&self, id: PurchaseOrderId) -> Result<Option<PurchaseOrder>, PurchasingError> {
        Ok(self.orders.get(id)?)
    }

    pub fn orders(&self) -> Result<Vec<PurchaseOrder>, PurchasingError> {
        Ok(self.orders.list()?)
    }

    pub fn orders_for(&self, medication_id: MedicationId) -> Result<Vec<PurchaseOrder>, PurchasingError> {
        Ok(self.orders.list_for_medication(medication_id)?)
    }

    /// Move an order to `to`.
    ///
    /// The transition is validated against the current status, then written
    /// with a compare-and-set so a concurrent change surfaces as a conflict
    /// instead of being overwritten.
    pub fn set_status(
        &self,
        id: PurchaseOrderId,
        to: PurchaseOrderStatus,
    ) -> Result<PurchaseOrder, PurchasingError> {
        let current = self.orders.get(id)?.ok_or(DomainError::NotFound)?;
        current.status.check_transition(to)?;

        match self.orders.update_status(id, current.status, to)? {
            Some(updated) => {
                tracing::info!(
                    purchase_order_id = %id,
                    from = %current.status,
                    to = %to,
                    "purchase order status changed"
                );
                Ok(updated)
            }
            None => {
                tracing::warn!(purchase_order_id = %id, "purchase order status changed concurrently");
                Err(DomainError::conflict("purchase order status changed concurrently").into())
            }
        }
    }
}
