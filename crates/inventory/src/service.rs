use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use clinic_core::{DomainError, MedicationId, PurchaseOrderId, StoreError};
use clinic_purchasing::{PurchaseOrder, PurchaseOrderStatus, PurchaseOrderStore};

use crate::medication::{Medication, MedicationUpdate, NewMedication, MAX_QUANTITY};
use crate::notify::{ReorderNotice, ReorderNotifier};
use crate::store::{Decrease, InventoryStore, MedicationStore};
use crate::thresholds::{PrescriptionPreview, ThresholdCheck};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("quantity {0} is out of range")]
    InvalidQuantity(i64),

    #[error("insufficient stock: {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for InventoryError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::NotFound => Self::NotFound,
            DomainError::Conflict(msg) | DomainError::InvariantViolation(msg) => Self::Conflict(msg),
        }
    }
}

/// Successful prescription: the stock left and the order raised, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeReceipt {
    pub after_stock: i64,
    pub purchase_order_id: Option<PurchaseOrderId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockEntry {
    pub medication: Medication,
    pub check: ThresholdCheck,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedOrder {
    pub order: PurchaseOrder,
    pub stock_after: i64,
}

/// Stock bookkeeping and the automatic reorder rule.
///
/// Holds no state of its own; every decision is taken from what the stores
/// report at the time of the call.
#[derive(Debug, Clone)]
pub struct InventoryService<M, I, P, N> {
    medications: M,
    stock: I,
    orders: P,
    notifier: N,
}

impl<M, I, P, N> InventoryService<M, I, P, N>
where
    M: MedicationStore,
    I: InventoryStore,
    P: PurchaseOrderStore,
    N: ReorderNotifier,
{
    pub fn new(medications: M, stock: I, orders: P, notifier: N) -> Self {
        Self {
            medications,
            stock,
            orders,
            notifier,
        }
    }

    pub fn current_stock(&self, medication_id: MedicationId) -> Result<i64, InventoryError> {
        Ok(self.stock.quantity(medication_id)?)
    }

    /// An unknown medication yields [`ThresholdCheck::unknown`].
    pub fn check_thresholds(&self, medication_id: MedicationId) -> Result<ThresholdCheck, InventoryError> {
        let Some(medication) = self.medications.get(medication_id)? else {
            tracing::debug!(%medication_id, "threshold check for unknown medication");
            return Ok(ThresholdCheck::unknown());
        };
        let current = self.stock.quantity(medication_id)?;
        Ok(ThresholdCheck::evaluate(&medication, current))
    }

    /// Dispense `quantity` units and raise a replenishment order when the
    /// remaining stock drops below the reorder point.
    pub fn consume_on_prescription(
        &self,
        medication_id: MedicationId,
        quantity: i64,
    ) -> Result<ConsumeReceipt, InventoryError> {
        if quantity <= 0 {
            tracing::warn!(%medication_id, quantity, "prescription rejected: non-positive quantity");
            return Err(InventoryError::InvalidQuantity(quantity));
        }

        let after_stock = match self.stock.decrease_if_available(medication_id, quantity)? {
            Decrease::Applied { after } => after,
            Decrease::Insufficient { available } => {
                tracing::warn!(
                    %medication_id,
                    available,
                    requested = quantity,
                    "prescription rejected: insufficient stock"
                );
                return Err(InventoryError::InsufficientStock {
                    available,
                    requested: quantity,
                });
            }
        };
        tracing::info!(%medication_id, quantity, after_stock, "stock consumed");

        let purchase_order_id = self.reorder_if_needed(medication_id, after_stock)?;
        Ok(ConsumeReceipt {
            after_stock,
            purchase_order_id,
        })
    }

    fn reorder_if_needed(
        &self,
        medication_id: MedicationId,
        after_stock: i64,
    ) -> Result<Option<PurchaseOrderId>, InventoryError> {
        // The decrement stands even when the record vanished meanwhile.
        let Some(medication) = self.medications.get(medication_id)? else {
            tracing::warn!(%medication_id, "medication missing after decrement; no reorder");
            return Ok(None);
        };

        if after_stock >= medication.reorder_point || medication.reorder_quantity <= 0 {
            return Ok(None);
        }

        let purchase_order_id = self
            .orders
            .insert_or_increase_pending(medication_id, medication.reorder_quantity)?;
        tracing::info!(
            %medication_id,
            %purchase_order_id,
            reorder_quantity = medication.reorder_quantity,
            after_stock,
            "reorder raised"
        );

        let notice = ReorderNotice::new(&medication, purchase_order_id, after_stock, Utc::now());
        if let Err(err) = self.notifier.notify(&notice) {
            tracing::warn!(%purchase_order_id, error = %err, "reorder notification failed");
        }

        Ok(Some(purchase_order_id))
    }

    pub fn register_medication(
        &self,
        form: NewMedication,
        initial_stock: Option<i64>,
    ) -> Result<Medication, InventoryError> {
        form.validate()?;
        if let Some(quantity) = initial_stock {
            if !(0..=MAX_QUANTITY).contains(&quantity) {
                return Err(InventoryError::Validation(format!(
                    "initial stock must be between 0 and {MAX_QUANTITY}"
                )));
            }
        }

        let medication = self.medications.insert(form.normalized())?;
        if let Some(quantity) = initial_stock {
            self.stock.upsert_quantity(medication.id, quantity)?;
        }
        tracing::info!(medication_id = %medication.id, sku = %medication.sku, "medication registered");
        Ok(medication)
    }

    pub fn update_medication(
        &self,
        medication_id: MedicationId,
        update: MedicationUpdate,
    ) -> Result<Medication, InventoryError> {
        let mut medication = self.require(medication_id)?;
        update.apply_to(&mut medication, Utc::now())?;
        if !self.medications.update(&medication)? {
            return Err(InventoryError::NotFound);
        }
        tracing::info!(%medication_id, "medication updated");
        Ok(medication)
    }

    pub fn medication(&self, medication_id: MedicationId) -> Result<Option<Medication>, InventoryError> {
        Ok(self.medications.get(medication_id)?)
    }

    pub fn medications(&self) -> Result<Vec<Medication>, InventoryError> {
        Ok(self.medications.list()?)
    }

    /// Overwrite the stock level after a physical count.
    pub fn set_stock(&self, medication_id: MedicationId, quantity: i64) -> Result<i64, InventoryError> {
        if !(0..=MAX_QUANTITY).contains(&quantity) {
            return Err(InventoryError::InvalidQuantity(quantity));
        }
        self.require(medication_id)?;
        self.stock.upsert_quantity(medication_id, quantity)?;
        tracing::info!(%medication_id, quantity, "stock level set");
        Ok(quantity)
    }

    /// Receive `quantity` units. Growth past `i64` is refused by the store
    /// with nothing written.
    pub fn restock(&self, medication_id: MedicationId, quantity: i64) -> Result<i64, InventoryError> {
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(InventoryError::InvalidQuantity(quantity));
        }
        self.require(medication_id)?;
        let after = self.stock.increase(medication_id, quantity)?;
        tracing::info!(%medication_id, quantity, after, "stock replenished");
        Ok(after)
    }

    pub fn preview_prescription(
        &self,
        medication_id: MedicationId,
        quantity: i64,
    ) -> Result<PrescriptionPreview, InventoryError> {
        let medication = self.require(medication_id)?;
        let current = self.stock.quantity(medication_id)?;
        Ok(PrescriptionPreview::project(&medication, current, quantity))
    }

    /// Medications currently below their reorder point, by name.
    pub fn low_stock(&self) -> Result<Vec<LowStockEntry>, InventoryError> {
        let mut entries = Vec::new();
        for medication in self.medications.list()? {
            let current = self.stock.quantity(medication.id)?;
            let check = ThresholdCheck::evaluate(&medication, current);
            if check.below_reorder_point {
                entries.push(LowStockEntry { medication, check });
            }
        }
        entries.sort_by(|a, b| a.medication.name.cmp(&b.medication.name));
        Ok(entries)
    }

    /// Book a delivered order into stock.
    ///
    /// The status flips to `Received` first, conditionally, so the same
    /// order can never be counted twice.
    pub fn receive_purchase_order(&self, purchase_order_id: PurchaseOrderId) -> Result<ReceivedOrder, InventoryError> {
        let order = self.orders.get(purchase_order_id)?.ok_or(InventoryError::NotFound)?;
        order.status.check_transition(PurchaseOrderStatus::Received)?;

        let Some(order) = self
            .orders
            .update_status(purchase_order_id, order.status, PurchaseOrderStatus::Received)?
        else {
            tracing::warn!(%purchase_order_id, "purchase order changed while receiving");
            return Err(InventoryError::Conflict(
                "purchase order status changed concurrently".to_string(),
            ));
        };

        let stock_after = self.stock.increase(order.medication_id, order.quantity)?;
        tracing::info!(
            %purchase_order_id,
            medication_id = %order.medication_id,
            quantity = order.quantity,
            stock_after,
            "purchase order received"
        );
        Ok(ReceivedOrder { order, stock_after })
    }

    /// Register the two demo medications when the catalogue is empty.
    /// Returns how many were added.
    pub fn seed_sample_medications(&self) -> Result<usize, InventoryError> {
        if !self.medications.list()?.is_empty() {
            return Ok(0);
        }
        let samples = [
            (
                NewMedication {
                    name: "Acetaminophen 500mg".to_string(),
                    sku: "ACETA-500".to_string(),
                    minimum_stock: 20,
                    reorder_point: 50,
                    reorder_quantity: 200,
                },
                120,
            ),
            (
                NewMedication {
                    name: "Amoxicillin 250mg".to_string(),
                    sku: "AMOXI-250".to_string(),
                    minimum_stock: 10,
                    reorder_point: 30,
                    reorder_quantity: 100,
                },
                25,
            ),
        ];
        let count = samples.len();
        for (form, stock) in samples {
            self.register_medication(form, Some(stock))?;
        }
        Ok(count)
    }

    fn require(&self, medication_id: MedicationId) -> Result<Medication, InventoryError> {
        self.medications.get(medication_id)?.ok_or(InventoryError::NotFound)
    }
}
