use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use clinic_core::{DomainError, MedicationId, PatientId};
use clinic_inventory::{NewMedication, ReorderNotice};
use clinic_patients::Patient;
use clinic_scheduling::DATE_TIME_FORMAT;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterMedicationRequest {
    #[serde(flatten)]
    pub medication: NewMedication,
    pub initial_stock: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct PrescriptionRequest {
    pub medication_id: MedicationId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub at: String,
    pub exclude: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseOrderQuery {
    pub medication_id: Option<String>,
}

/// Accepts `yyyy-MM-dd HH:mm` or ISO-8601 (`2026-03-02T10:00:00`).
pub fn parse_date_time(raw: &str) -> Result<NaiveDateTime, DomainError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .or_else(|_| raw.parse::<NaiveDateTime>())
        .map_err(|_| DomainError::validation(format!("invalid date-time '{raw}'")))
}

// -------------------------
// Response DTOs
// -------------------------

/// List view of a patient: the registration number is masked.
#[derive(Debug, Serialize)]
pub struct PatientSummary {
    pub id: PatientId,
    pub name: String,
    pub resident_registration_number: String,
    pub contact: String,
}

impl From<&Patient> for PatientSummary {
    fn from(p: &Patient) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            resident_registration_number: p.masked_registration_number(),
            contact: p.contact.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockView {
    pub medication_id: MedicationId,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityView {
    pub doctor: String,
    pub at: NaiveDateTime,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct NoticesView {
    pub count: usize,
    pub notices: Vec<ReorderNotice>,
}
