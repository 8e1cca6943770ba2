use chrono::{NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use clinic_core::{AppointmentId, DomainError, PatientId, StoreError};
use clinic_patients::PatientStore;

use crate::appointment::Appointment;
use crate::doctor::DoctorName;
use crate::request::BookingRequest;
use crate::slots::{available_labels, DaySchedule, WorkingHours};
use crate::store::{AppointmentStore, SlotWrite};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown patient {0}")]
    UnknownPatient(PatientId),

    #[error("not found")]
    NotFound,

    #[error("{doctor} is already booked at {at}")]
    SlotTaken { doctor: String, at: NaiveDateTime },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for SchedulingError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound => Self::NotFound,
            DomainError::Validation(msg)
            | DomainError::InvalidId(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::Conflict(msg) => Self::Validation(msg),
        }
    }
}

/// Slot availability and the booking workflow.
#[derive(Debug, Clone)]
pub struct SchedulingService<A, P> {
    appointments: A,
    patients: P,
    hours: WorkingHours,
}

impl<A, P> SchedulingService<A, P>
where
    A: AppointmentStore,
    P: PatientStore,
{
    pub fn new(appointments: A, patients: P, hours: WorkingHours) -> Self {
        Self {
            appointments,
            patients,
            hours,
        }
    }

    pub fn working_hours(&self) -> WorkingHours {
        self.hours
    }

    /// Free `HH:MM` slots for the doctor on `date`, ascending. A blank
    /// doctor name has no slots.
    pub fn available_slots(&self, doctor: &str, date: NaiveDate) -> Result<Vec<String>, SchedulingError> {
        let Ok(doctor) = DoctorName::new(doctor) else {
            return Ok(Vec::new());
        };
        let booked = self.appointments.list_by_doctor_and_date(&doctor, date)?;
        Ok(available_labels(&self.hours, &booked))
    }

    /// Whether `doctor` is free at exactly `at`, ignoring `exclude` (the
    /// appointment being edited). Nobody can hold a slot under a blank name.
    pub fn is_slot_available(
        &self,
        doctor: &str,
        at: NaiveDateTime,
        exclude: Option<AppointmentId>,
    ) -> Result<bool, SchedulingError> {
        let Ok(doctor) = DoctorName::new(doctor) else {
            return Ok(true);
        };
        Ok(self.holder_of(&doctor, at, exclude)?.is_none())
    }

    fn holder_of(
        &self,
        doctor: &DoctorName,
        at: NaiveDateTime,
        exclude: Option<AppointmentId>,
    ) -> Result<Option<AppointmentId>, SchedulingError> {
        let holder = self
            .appointments
            .list_by_doctor_and_date(doctor, at.date())?
            .into_iter()
            .find(|a| Some(a.id) != exclude && a.occupies(doctor, at))
            .map(|a| a.id);
        Ok(holder)
    }

    pub fn day_schedule(&self, doctor: &str, date: NaiveDate) -> Result<DaySchedule, SchedulingError> {
        let Ok(doctor) = DoctorName::new(doctor) else {
            return Ok(DaySchedule {
                booked: Vec::new(),
                available: Vec::new(),
            });
        };
        let appointments = self.appointments.list_by_doctor_and_date(&doctor, date)?;
        Ok(DaySchedule::build(&self.hours, &appointments))
    }

    pub fn book(&self, request: &BookingRequest) -> Result<Appointment, SchedulingError> {
        let form = request.to_new_appointment()?;
        self.require_patient(form.patient_id)?;

        let at = form.scheduled_at;
        if self.holder_of(&form.doctor_name, at, None)?.is_some() {
            return Err(self.slot_taken(&form.doctor_name, at));
        }

        let doctor = form.doctor_name.clone();
        match self.appointments.insert(form)? {
            SlotWrite::Written(appointment) => {
                tracing::info!(
                    appointment_id = %appointment.id,
                    doctor = %appointment.doctor_name,
                    scheduled_at = %appointment.scheduled_at,
                    "appointment booked"
                );
                Ok(appointment)
            }
            SlotWrite::Conflict { .. } | SlotWrite::Missing => Err(self.slot_taken(&doctor, at)),
        }
    }

    /// Replace an appointment's details. Fields the request leaves unset
    /// (patient, status) keep their current values.
    pub fn update(&self, id: AppointmentId, request: &BookingRequest) -> Result<Appointment, SchedulingError> {
        let current = self.appointments.get(id)?.ok_or(SchedulingError::NotFound)?;

        let mut next = current.clone();
        next.patient_id = request.patient_id.unwrap_or(current.patient_id);
        next.doctor_name = DoctorName::new(&request.doctor_name)?;
        next.scheduled_at = request.resolve_scheduled_at()?;
        next.reason = request.reason.trim().to_string();
        next.notes = request.notes.trim().to_string();
        next.status = request.status.unwrap_or(current.status);
        next.validate()?;
        next.updated_at = Utc::now();

        if next.patient_id != current.patient_id {
            self.require_patient(next.patient_id)?;
        }

        if next.is_active() && self.holder_of(&next.doctor_name, next.scheduled_at, Some(id))?.is_some() {
            return Err(self.slot_taken(&next.doctor_name, next.scheduled_at));
        }

        match self.appointments.update(&next)? {
            SlotWrite::Written(appointment) => {
                tracing::info!(appointment_id = %id, status = %appointment.status, "appointment updated");
                Ok(appointment)
            }
            SlotWrite::Conflict { .. } => Err(self.slot_taken(&next.doctor_name, next.scheduled_at)),
            SlotWrite::Missing => Err(SchedulingError::NotFound),
        }
    }

    pub fn cancel(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        let appointment = self.appointments.cancel(id)?.ok_or(SchedulingError::NotFound)?;
        tracing::info!(appointment_id = %id, "appointment cancelled");
        Ok(appointment)
    }

    pub fn appointment(&self, id: AppointmentId) -> Result<Option<Appointment>, SchedulingError> {
        Ok(self.appointments.get(id)?)
    }

    pub fn appointments_for_patient(&self, patient_id: PatientId) -> Result<Vec<Appointment>, SchedulingError> {
        Ok(self.appointments.list_by_patient(patient_id)?)
    }

    /// Doctors seen on appointments, sorted case-insensitively.
    pub fn doctors(&self) -> Result<Vec<String>, SchedulingError> {
        let mut names: Vec<DoctorName> = self
            .appointments
            .distinct_doctor_names()?
            .iter()
            .filter_map(|n| DoctorName::new(n).ok())
            .collect();
        names.sort_by(|a, b| a.key().cmp(b.key()).then_with(|| a.as_str().cmp(b.as_str())));
        names.dedup();
        Ok(names.into_iter().map(String::from).collect())
    }

    fn require_patient(&self, patient_id: PatientId) -> Result<(), SchedulingError> {
        if self.patients.get(patient_id)?.is_none() {
            tracing::warn!(%patient_id, "booking rejected: unknown patient");
            return Err(SchedulingError::UnknownPatient(patient_id));
        }
        Ok(())
    }

    fn slot_taken(&self, doctor: &DoctorName, at: NaiveDateTime) -> SchedulingError {
        tracing::warn!(doctor = %doctor, %at, "booking rejected: slot taken");
        SchedulingError::SlotTaken {
            doctor: doctor.to_string(),
            at,
        }
    }
}
