//! `clinic-core`: shared building blocks for the clinic domain crates.
//!
//! Identifiers, the domain/store error split, and the small marker traits the
//! domain types implement. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;
pub mod store;
pub mod value_object;

pub use entity::Entity;
pub use error::{require_text, DomainError, DomainResult};
pub use id::{AppointmentId, MedicationId, PatientId, PurchaseOrderId};
pub use store::{StoreError, StoreResult};
pub use value_object::ValueObject;
