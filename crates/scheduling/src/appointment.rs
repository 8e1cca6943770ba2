use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use clinic_core::{require_text, AppointmentId, DomainError, DomainResult, Entity, PatientId};

use crate::doctor::DoctorName;
use crate::slots::slot_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether an appointment in this status holds its slot.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl core::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown appointment status '{other}'"
            ))),
        }
    }
}

/// A booked visit. `scheduled_at` is clinic-local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_name: DoctorName,
    pub scheduled_at: NaiveDateTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn is_active(&self) -> bool {
        self.status.holds_slot()
    }

    pub fn slot_label(&self) -> String {
        slot_label(self.scheduled_at.time())
    }

    /// True when this appointment blocks `doctor` at exactly `at`.
    pub fn occupies(&self, doctor: &DoctorName, at: NaiveDateTime) -> bool {
        self.is_active() && self.doctor_name == *doctor && self.scheduled_at == at
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_text("reason", &self.reason)
    }
}

impl Entity for Appointment {
    type Id = AppointmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A validated booking, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: PatientId,
    pub doctor_name: DoctorName,
    pub scheduled_at: NaiveDateTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub notes: String,
}

impl NewAppointment {
    /// New bookings cannot start out cancelled.
    pub fn validate(&self) -> DomainResult<()> {
        require_text("reason", &self.reason)?;
        if !self.status.holds_slot() {
            return Err(DomainError::validation(
                "a new appointment cannot be created as cancelled",
            ));
        }
        Ok(())
    }

    /// Materialize with a store-assigned id.
    pub fn into_appointment(self, id: AppointmentId, now: DateTime<Utc>) -> Appointment {
        Appointment {
            id,
            patient_id: self.patient_id,
            doctor_name: self.doctor_name,
            scheduled_at: self.scheduled_at,
            reason: self.reason.trim().to_string(),
            status: self.status,
            notes: self.notes.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn form() -> NewAppointment {
        NewAppointment {
            patient_id: PatientId::new(),
            doctor_name: DoctorName::new("Dr. Kim").unwrap(),
            scheduled_at: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            reason: " follow-up ".to_string(),
            status: AppointmentStatus::Scheduled,
            notes: String::new(),
        }
    }

    #[test]
    fn cancelled_booking_is_rejected() {
        let mut f = form();
        f.status = AppointmentStatus::Cancelled;
        assert!(f.validate().is_err());
    }

    #[test]
    fn blank_reason_is_rejected() {
        let mut f = form();
        f.reason = " ".to_string();
        assert!(f.validate().is_err());
    }

    #[test]
    fn materialized_appointment_occupies_its_slot() {
        let f = form();
        let at = f.scheduled_at;
        let appt = f.into_appointment(AppointmentId::new(), Utc::now());
        assert_eq!(appt.reason, "follow-up");
        assert_eq!(appt.slot_label(), "10:30");
        assert!(appt.occupies(&DoctorName::new("DR. KIM").unwrap(), at));
        assert!(!appt.occupies(&DoctorName::new("Dr. Lee").unwrap(), at));
    }

    #[test]
    fn status_parses_both_spellings() {
        assert_eq!("canceled".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Cancelled);
        assert_eq!(" Completed".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Completed);
        assert!("no-show".parse::<AppointmentStatus>().is_err());
    }
}
