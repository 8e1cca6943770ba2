//! Persistence seams for medications and stock levels.

use std::sync::Arc;

use clinic_core::{MedicationId, StoreResult};

use crate::medication::{Medication, NewMedication};

/// Outcome of a conditional stock decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrease {
    /// Stock was reduced; `after` is the persisted level.
    Applied { after: i64 },
    /// Not enough stock; nothing changed.
    Insufficient { available: i64 },
}

pub trait MedicationStore: Send + Sync {
    fn insert(&self, medication: NewMedication) -> StoreResult<Medication>;
    fn get(&self, id: MedicationId) -> StoreResult<Option<Medication>>;
    /// All medications ordered by name.
    fn list(&self) -> StoreResult<Vec<Medication>>;
    /// Returns `false` when the id is unknown.
    fn update(&self, medication: &Medication) -> StoreResult<bool>;
}

/// Stock levels keyed by medication. A missing level reads as zero.
pub trait InventoryStore: Send + Sync {
    fn quantity(&self, medication_id: MedicationId) -> StoreResult<i64>;

    fn upsert_quantity(&self, medication_id: MedicationId, quantity: i64) -> StoreResult<()>;

    /// Add `delta` units and return the new level.
    fn increase(&self, medication_id: MedicationId, delta: i64) -> StoreResult<i64>;

    /// Remove `delta` units only if at least that many are on hand, as one
    /// atomic step. Stock never goes negative.
    fn decrease_if_available(&self, medication_id: MedicationId, delta: i64) -> StoreResult<Decrease>;
}

impl<S> MedicationStore for Arc<S>
where
    S: MedicationStore + ?Sized,
{
    fn insert(&self, medication: NewMedication) -> StoreResult<Medication> {
        (**self).insert(medication)
    }

    fn get(&self, id: MedicationId) -> StoreResult<Option<Medication>> {
        (**self).get(id)
    }

    fn list(&self) -> StoreResult<Vec<Medication>> {
        (**self).list()
    }

    fn update(&self, medication: &Medication) -> StoreResult<bool> {
        (**self).update(medication)
    }
}

impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    fn quantity(&self, medication_id: MedicationId) -> StoreResult<i64> {
        (**self).quantity(medication_id)
    }

    fn upsert_quantity(&self, medication_id: MedicationId, quantity: i64) -> StoreResult<()> {
        (**self).upsert_quantity(medication_id, quantity)
    }

    fn increase(&self, medication_id: MedicationId, delta: i64) -> StoreResult<i64> {
        (**self).increase(medication_id, delta)
    }

    fn decrease_if_available(&self, medication_id: MedicationId, delta: i64) -> StoreResult<Decrease> {
        (**self).decrease_if_available(medication_id, delta)
    }
}
