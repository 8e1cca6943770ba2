use std::sync::Arc;

use clinic_inventory::{InventoryStore, MedicationStore};
use clinic_patients::PatientStore;
use clinic_purchasing::PurchaseOrderStore;
use clinic_scheduling::AppointmentStore;

/// Every store seam in one object, so a single backend can be shared by all
/// services as `Arc<dyn ClinicStore>`.
pub trait ClinicStore:
    PatientStore + MedicationStore + InventoryStore + PurchaseOrderStore + AppointmentStore
{
    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}

impl ClinicStore for crate::memory::InMemoryClinicStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

impl ClinicStore for crate::postgres::PgClinicStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}

pub type SharedStore = Arc<dyn ClinicStore>;
