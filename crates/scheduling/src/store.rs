use std::sync::Arc;

use chrono::NaiveDate;

use clinic_core::{AppointmentId, PatientId, StoreResult};

use crate::appointment::{Appointment, NewAppointment};
use crate::doctor::DoctorName;

/// Result of a slot-guarded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotWrite {
    Written(Appointment),
    /// Another active appointment already holds the doctor's slot.
    Conflict { existing: AppointmentId },
    /// Update of an id the store does not know.
    Missing,
}

/// Appointment persistence seam.
///
/// `insert` and `update` check "no other active appointment for this doctor
/// at this exact time" and write in one atomic step. Cancelled appointments
/// never conflict.
pub trait AppointmentStore: Send + Sync {
    fn get(&self, id: AppointmentId) -> StoreResult<Option<Appointment>>;

    /// Newest first.
    fn list_by_patient(&self, patient_id: PatientId) -> StoreResult<Vec<Appointment>>;

    /// All appointments (cancelled included) for the doctor on `date`,
    /// ordered by time.
    fn list_by_doctor_and_date(&self, doctor: &DoctorName, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    fn distinct_doctor_names(&self) -> StoreResult<Vec<String>>;

    fn insert(&self, appointment: NewAppointment) -> StoreResult<SlotWrite>;

    fn update(&self, appointment: &Appointment) -> StoreResult<SlotWrite>;

    /// Mark as cancelled. `None` when the id is unknown.
    fn cancel(&self, id: AppointmentId) -> StoreResult<Option<Appointment>>;
}

impl<S> AppointmentStore for Arc<S>
where
    S: AppointmentStore + ?Sized,
{
    fn get(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        (**self).get(id)
    }

    fn list_by_patient(&self, patient_id: PatientId) -> StoreResult<Vec<Appointment>> {
        (**self).list_by_patient(patient_id)
    }

    fn list_by_doctor_and_date(&self, doctor: &DoctorName, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        (**self).list_by_doctor_and_date(doctor, date)
    }

    fn distinct_doctor_names(&self) -> StoreResult<Vec<String>> {
        (**self).distinct_doctor_names()
    }

    fn insert(&self, appointment: NewAppointment) -> StoreResult<SlotWrite> {
        (**self).insert(appointment)
    }

    fn update(&self, appointment: &Appointment) -> StoreResult<SlotWrite> {
        (**self).update(appointment)
    }

    fn cancel(&self, id: AppointmentId) -> StoreResult<Option<Appointment>> {
        (**self).cancel(id)
    }
}
