//! Patient registration.
//!
//! Patients are plain records: other modules only need to know that a
//! patient id exists. Validation is pure; persistence goes through
//! [`PatientStore`].

pub mod patient;
pub mod service;

pub use patient::{NewPatient, Patient, PatientStore, PatientUpdate};
pub use service::{PatientError, PatientService};
