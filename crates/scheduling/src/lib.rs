//! Appointment scheduling: the working-hours slot grid, availability checks
//! and the booking workflow.
//!
//! "One active appointment per doctor and exact time" is checked before a
//! write and enforced again by [`AppointmentStore`] as part of the write.

pub mod appointment;
pub mod doctor;
pub mod request;
pub mod service;
pub mod slots;
pub mod store;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use doctor::DoctorName;
pub use request::{BookingRequest, DATE_TIME_FORMAT};
pub use service::{SchedulingError, SchedulingService};
pub use slots::{available_labels, parse_slot_label, slot_label, DaySchedule, WorkingHours};
pub use store::{AppointmentStore, SlotWrite};
