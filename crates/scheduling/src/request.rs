//! Booking form as it arrives from a client.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use clinic_core::{DomainError, DomainResult, PatientId};

use crate::appointment::{AppointmentStatus, NewAppointment};
use crate::doctor::DoctorName;
use crate::slots::parse_slot_label;

/// Free-text date-time format accepted when no slot is picked.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Raw booking input. Either `date` + `slot` or `date_time` must be given;
/// the date and slot pair wins when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient_id: Option<PatientId>,
    #[serde(default)]
    pub doctor_name: String,
    pub date: Option<NaiveDate>,
    pub slot: Option<String>,
    pub date_time: Option<String>,
    #[serde(default)]
    pub reason: String,
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub notes: String,
}

impl BookingRequest {
    pub fn resolve_scheduled_at(&self) -> DomainResult<NaiveDateTime> {
        if let (Some(date), Some(slot)) = (self.date, self.slot.as_deref()) {
            if !slot.trim().is_empty() {
                return Ok(date.and_time(parse_slot_label(slot)?));
            }
        }
        match self.date_time.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
                .map_err(|_| {
                    DomainError::validation(format!(
                        "invalid date-time '{text}', expected yyyy-MM-dd HH:mm"
                    ))
                }),
            _ => Err(DomainError::validation("appointment date and time are required")),
        }
    }

    /// Check required fields and resolve the form into a booking.
    pub fn to_new_appointment(&self) -> DomainResult<NewAppointment> {
        let patient_id = self
            .patient_id
            .ok_or_else(|| DomainError::validation("patient is required"))?;
        let doctor_name = DoctorName::new(&self.doctor_name)?;
        let scheduled_at = self.resolve_scheduled_at()?;
        let form = NewAppointment {
            patient_id,
            doctor_name,
            scheduled_at,
            reason: self.reason.clone(),
            status: self.status.unwrap_or(AppointmentStatus::Scheduled),
            notes: self.notes.clone(),
        };
        form.validate()?;
        Ok(form)
    }
}
