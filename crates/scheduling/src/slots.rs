//! Working-hours slot grid.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use clinic_core::{DomainError, DomainResult, ValueObject};

use crate::appointment::Appointment;

/// Bookable window of a clinic day, cut into fixed-length slots.
/// `end` is exclusive: a slot must start before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    start: NaiveTime,
    end: NaiveTime,
    slot_minutes: u32,
}

impl ValueObject for WorkingHours {}

impl Default for WorkingHours {
    /// 09:00 to 17:00 in 30-minute slots.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 30,
        }
    }
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime, slot_minutes: u32) -> DomainResult<Self> {
        if slot_minutes == 0 || slot_minutes > 24 * 60 {
            return Err(DomainError::validation(
                "slot length must be between 1 and 1440 minutes",
            ));
        }
        if start >= end {
            return Err(DomainError::validation("working day must start before it ends"));
        }
        Ok(Self {
            start,
            end,
            slot_minutes,
        })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    /// Slot start times, ascending.
    pub fn slots(&self) -> Vec<NaiveTime> {
        let step = chrono::Duration::minutes(i64::from(self.slot_minutes));
        let mut slots = Vec::new();
        let mut t = self.start;
        while t < self.end {
            slots.push(t);
            let (next, wrapped) = t.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            t = next;
        }
        slots
    }

    pub fn labels(&self) -> Vec<String> {
        self.slots().into_iter().map(slot_label).collect()
    }
}

/// `HH:MM`, zero padded, 24-hour.
pub fn slot_label(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub fn parse_slot_label(label: &str) -> DomainResult<NaiveTime> {
    NaiveTime::parse_from_str(label.trim(), "%H:%M")
        .map_err(|_| DomainError::validation(format!("invalid time slot '{}'", label.trim())))
}

/// Grid labels not held by any active appointment in `booked`.
///
/// The caller passes one doctor's appointments for one day; cancelled
/// entries are skipped here.
pub fn available_labels(hours: &WorkingHours, booked: &[Appointment]) -> Vec<String> {
    let taken = booked_labels(booked);
    hours
        .labels()
        .into_iter()
        .filter(|label| !taken.contains(label))
        .collect()
}

/// Labels held by active appointments, sorted and de-duplicated.
pub fn booked_labels(booked: &[Appointment]) -> Vec<String> {
    let mut labels: Vec<String> = booked
        .iter()
        .filter(|a| a.is_active())
        .map(Appointment::slot_label)
        .collect();
    labels.sort();
    labels.dedup();
    labels
}

/// A doctor's day at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub booked: Vec<String>,
    pub available: Vec<String>,
}

impl DaySchedule {
    pub fn build(hours: &WorkingHours, appointments: &[Appointment]) -> Self {
        Self {
            booked: booked_labels(appointments),
            available: available_labels(hours, appointments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::AppointmentStatus;
    use crate::doctor::DoctorName;
    use chrono::{NaiveDate, Utc};
    use clinic_core::{AppointmentId, PatientId};
    use proptest::prelude::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn appointment(time: NaiveTime, status: AppointmentStatus) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: AppointmentId::new(),
            patient_id: PatientId::new(),
            doctor_name: DoctorName::new("Dr. Kim").unwrap(),
            scheduled_at: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap().and_time(time),
            reason: "checkup".to_string(),
            status,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn default_day_has_sixteen_half_hour_slots() {
        let labels = WorkingHours::default().labels();
        assert_eq!(labels.len(), 16);
        assert_eq!(labels.first().map(String::as_str), Some("09:00"));
        assert_eq!(labels.last().map(String::as_str), Some("16:30"));
        assert!(!labels.contains(&"17:00".to_string()));
    }

    #[test]
    fn booked_slot_is_removed_and_cancelled_one_is_not() {
        let booked = vec![
            appointment(at(10, 0), AppointmentStatus::Scheduled),
            appointment(at(11, 0), AppointmentStatus::Cancelled),
            appointment(at(12, 0), AppointmentStatus::Completed),
        ];
        let available = available_labels(&WorkingHours::default(), &booked);
        assert!(!available.contains(&"10:00".to_string()));
        assert!(available.contains(&"11:00".to_string()));
        assert!(!available.contains(&"12:00".to_string()));
        assert_eq!(available.len(), 14);
    }

    #[test]
    fn off_grid_booking_does_not_hide_grid_slots() {
        let booked = vec![appointment(at(10, 15), AppointmentStatus::Scheduled)];
        assert_eq!(available_labels(&WorkingHours::default(), &booked).len(), 16);
    }

    #[test]
    fn day_schedule_lists_booked_once() {
        let booked = vec![
            appointment(at(14, 0), AppointmentStatus::Scheduled),
            appointment(at(9, 30), AppointmentStatus::Scheduled),
            appointment(at(14, 0), AppointmentStatus::Completed),
        ];
        let day = DaySchedule::build(&WorkingHours::default(), &booked);
        assert_eq!(day.booked, vec!["09:30".to_string(), "14:00".to_string()]);
        assert_eq!(day.available.len(), 14);
    }

    #[test]
    fn invalid_hours_are_rejected() {
        assert!(WorkingHours::new(at(17, 0), at(9, 0), 30).is_err());
        assert!(WorkingHours::new(at(9, 0), at(17, 0), 0).is_err());
    }

    #[test]
    fn slot_labels_parse_back() {
        assert_eq!(parse_slot_label(" 09:30 ").unwrap(), at(9, 30));
        assert!(parse_slot_label("9.30").is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: available labels are an ascending subset of the grid,
        /// disjoint from what active appointments hold.
        #[test]
        fn available_is_ascending_subset_of_grid(
            taken in proptest::collection::vec(0u32..16, 0..16),
        ) {
            let hours = WorkingHours::default();
            let booked: Vec<Appointment> = taken
                .iter()
                .map(|i| appointment(at(9 + i / 2, (i % 2) * 30), AppointmentStatus::Scheduled))
                .collect();
            let grid = hours.labels();
            let available = available_labels(&hours, &booked);
            let held = booked_labels(&booked);

            prop_assert!(available.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(available.iter().all(|l| grid.contains(l)));
            prop_assert!(available.iter().all(|l| !held.contains(l)));
            prop_assert_eq!(available.len() + held.len(), grid.len());
        }

        /// Property: every grid has ceil(window / slot) slots.
        #[test]
        fn grid_size_matches_window(start_h in 0u32..12, len_h in 1u32..12, slot in 5u32..120) {
            let hours = WorkingHours::new(at(start_h, 0), at(start_h + len_h, 0), slot).unwrap();
            let window = len_h * 60;
            prop_assert_eq!(hours.slots().len() as u32, window.div_ceil(slot));
        }
    }
}
