//! In-process store for tests, demos and single-node dev runs.
//!
//! Every table sits behind one `RwLock`, so each trait method observes and
//! mutates a consistent snapshot: conditional writes (slot guard, stock
//! floor, pending-order merge, status CAS) are atomic by construction.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};

use clinic_core::{AppointmentId, MedicationId, PatientId, PurchaseOrderId, StoreError, StoreResult};
use clinic_inventory::{Decrease, InventoryStore, Medication, MedicationStore, NewMedication};
use clinic_patients::{NewPatient, Patient, PatientStore};
use clinic_purchasing::{PurchaseOrder, PurchaseOrderStatus, PurchaseOrderStore};
use clinic_scheduling::{Appointment, AppointmentStatus, AppointmentStore, DoctorName, NewAppointment, SlotWrite};

#[derive(Debug, Default)]
struct Tables {
    patients: HashMap<PatientId, Patient>,
    medications: HashMap<MedicationId, Medication>,
    stock: HashMap<MedicationId, i64>,
    orders: HashMap<PurchaseOrderId, PurchaseOrder>,
    appointments: HashMap<AppointmentId, Appointment>,
}

impl Tables {
    fn slot_holder(&self, candidate: &Appointment) -> Option<AppointmentId> {
        self.appointments
            .values()
            .find(|a| a.id != candidate.id && a.occupies(&candidate.doctor_name, candidate.scheduled_at))
            .map(|a| a.id)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryClinicStore {
    tables: RwLock<Tables>,
}

impl InMemoryClinicStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::poisoned())
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::poisoned())
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> chrono::DateTime<Utc>) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

impl PatientStore for InMemoryClinicStore {
    fn insert(&self, patient: NewPatient) -> StoreResult<Patient> {
        let now = Utc::now();
        let record = Patient {
            id: PatientId::new(),
            name: patient.name,
            resident_registration_number: patient.resident_registration_number,
            address: patient.address,
            contact: patient.contact,
            created_at: now,
            updated_at: now,
        };
        self.write()?.patients.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        Ok(self.read()?.patients.get(&id).cloned())
    }

    fn list(&self) -> StoreResult<Vec<Patient>> {
        let mut patients: Vec<Patient> = self.read()?.patients.values().cloned().collect();
        patients.sort_by_key(|p| (p.created_at, p.id));
        Ok(patients)
    }

    fn update(&self, patient: &Patient) -> StoreResult<bool> {
        let mut tables = self.write()?;
        match tables.patients.get_mut(&patient.id) {
            Some(slot) => {
                *slot = patient.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl MedicationStore for InMemoryClinicStore {
    fn insert(&self, medication: NewMedication) -> StoreResult<Medication> {
        let now = Utc::now();
        let record = Medication {
            id: MedicationId::new(),
            name: medication.name,
            sku: medication.sku,
            minimum_stock: medication.minimum_stock,
            reorder_point: medication.reorder_point,
            reorder_quantity: medication.reorder_quantity,
            created_at: now,
            updated_at: now,
        };
        self.write()?.medications.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: MedicationId) -> StoreResult<Option<Medication>> {
        Ok(self.read()?.medications.get(&id).cloned())
    }

    fn list(&self) -> StoreResult<Vec<Medication>> {
        let mut meds: Vec<Medication> = self.read()?.medications.values().cloned().collect();
        meds.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(meds)
    }

    fn update(&self, medication: &Medication) -> StoreResult<bool> {
        let mut tables = self.write()?;
        match tables.medications.get_mut(&medication.id) {
            Some(slot) => {
                *slot = medication.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl InventoryStore for InMemoryClinicStore {
    fn quantity(&self, medication_id: MedicationId) -> StoreResult<i64> {
        Ok(self.read()?.stock.get(&medication_id).copied().unwrap_or(0))
    }

    fn upsert_quantity(&self, medication_id: MedicationId, quantity: i64) -> StoreResult<()> {
        self.write()?.stock.insert(medication_id, quantity);
        Ok(())
    }

    fn increase(&self, medication_id: MedicationId, delta: i64) -> StoreResult<i64> {
        let mut tables = self.write()?;
        let level = tables.stock.entry(medication_id).or_insert(0);
        *level = level.checked_add(delta).ok_or_else(|| {
            StoreError::Conflict(format!("stock for {medication_id} cannot grow by {delta}"))
        })?;
        Ok(*level)
    }

    fn decrease_if_available(&self, medication_id: MedicationId, delta: i64) -> StoreResult<Decrease> {
        let mut tables = self.write()?;
        let available = tables.stock.get(&medication_id).copied().unwrap_or(0);
        if available < delta {
            return Ok(Decrease::Insufficient { available });
        }
        let after = available - delta;
        tables.stock.insert(medication_id, after);
        Ok(Decrease::Applied { after })
    }
}

impl PurchaseOrderStore for InMemoryClinicStore {
    fn insert_or_increase_pending(
        &self,
        medication_id: MedicationId,
        quantity: i64,
    ) -> StoreResult<PurchaseOrderId> {
        let now = Utc::now();
        let mut tables = self.write()?;
        if let Some(order) = tables
            .orders
            .values_mut()
            .find(|o| o.medication_id == medication_id && o.is_pending())
        {
            order
                .accumulate(quantity, now)
                .map_err(|e| StoreError::Conflict(e.to_string()))?;
            return Ok(order.id);
        }
        let order = PurchaseOrder::pending(medication_id, quantity, now);
        let id = order.id;
        tables.orders.insert(id, order);
        Ok(id)
    }

    fn get(&self, id: PurchaseOrderId) -> StoreResult<Option<PurchaseOrder>> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    fn list(&self) -> StoreResult<Vec<PurchaseOrder>> {
        let mut orders: Vec<PurchaseOrder> = self.read()?.orders.values().cloned().collect();
        newest_first(&mut orders, |o| o.created_at);
        Ok(orders)
    }

    fn list_for_medication(&self, medication_id: MedicationId) -> StoreResult<Vec<PurchaseOrder>> {
        let mut orders: Vec<PurchaseOrder> = self
            .read()?
            .orders
            .values()
            .filter(|o| o.medication_id == medication_id)
            .cloned()
            .collect();
        newest_first(&mut orders, |o| o.created_at);
        Ok(orders)
    }

    fn update_status(
        &self,
        id: PurchaseOrderId,
        from: PurchaseOrderStatus,
        to: PurchaseOrderStatus,
    ) -> StoreResult<Option<PurchaseOrder>> {
        let mut tables = self.write()?;
        match tables.orders.get_mut(&id) {
            Some(order) if order.status == from => {
                order.status = to;
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }
}

impl AppointmentStore for InMemoryClinicStore {
    fn get(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        Ok(self.read()?.appointments.get(&id).cloned())
    }

    fn list_by_patient(&self, patient_id: PatientId) -> StoreResult<Vec<Appointment>> {
        let mut list: Vec<Appointment> = self
            .read()?
            .appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        Ok(list)
    }

    fn list_by_doctor_and_date(&self, doctor: &DoctorName, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let mut list: Vec<Appointment> = self
            .read()?
            .appointments
            .values()
            .filter(|a| a.doctor_name == *doctor && a.scheduled_at.date() == date)
            .cloned()
            .collect();
        list.sort_by_key(|a| (a.scheduled_at, a.id));
        Ok(list)
    }

    fn distinct_doctor_names(&self) -> StoreResult<Vec<String>> {
        let tables = self.read()?;
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for appt in tables.appointments.values() {
            seen.entry(appt.doctor_name.key()).or_insert(appt.doctor_name.as_str());
        }
        Ok(seen.into_values().map(str::to_string).collect())
    }

    fn insert(&self, appointment: NewAppointment) -> StoreResult<SlotWrite> {
        let record = appointment.into_appointment(AppointmentId::new(), Utc::now());
        let mut tables = self.write()?;
        if let Some(existing) = tables.slot_holder(&record) {
            return Ok(SlotWrite::Conflict { existing });
        }
        tables.appointments.insert(record.id, record.clone());
        Ok(SlotWrite::Written(record))
    }

    fn update(&self, appointment: &Appointment) -> StoreResult<SlotWrite> {
        let mut tables = self.write()?;
        if !tables.appointments.contains_key(&appointment.id) {
            return Ok(SlotWrite::Missing);
        }
        if appointment.is_active() {
            if let Some(existing) = tables.slot_holder(appointment) {
                return Ok(SlotWrite::Conflict { existing });
            }
        }
        tables.appointments.insert(appointment.id, appointment.clone());
        Ok(SlotWrite::Written(appointment.clone()))
    }

    fn cancel(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        let mut tables = self.write()?;
        let Some(appt) = tables.appointments.get_mut(&id) else {
            return Ok(None);
        };
        appt.status = AppointmentStatus::Cancelled;
        appt.updated_at = Utc::now();
        Ok(Some(appt.clone()))
    }
}
