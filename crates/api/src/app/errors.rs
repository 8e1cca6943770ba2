use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use clinic_core::{DomainError, StoreError};
use clinic_inventory::InventoryError;
use clinic_patients::PatientError;
use clinic_purchasing::PurchasingError;
use clinic_scheduling::SchedulingError;

/// Service error -> `{"error": code, "message": text}` with a status code.
pub trait ErrorResponse {
    fn into_error_response(self) -> Response;
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn store_error_to_response(err: StoreError) -> Response {
    tracing::warn!(error = %err, "store failure");
    match err {
        StoreError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        _ => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string()),
    }
}

fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::InvariantViolation(msg) => json_error(StatusCode::CONFLICT, "invalid_transition", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
    }
}

impl ErrorResponse for InventoryError {
    fn into_error_response(self) -> Response {
        let message = self.to_string();
        match self {
            InventoryError::InvalidQuantity(_) => {
                json_error(StatusCode::BAD_REQUEST, "invalid_quantity", message)
            }
            InventoryError::InsufficientStock { .. } => {
                json_error(StatusCode::CONFLICT, "insufficient_stock", message)
            }
            InventoryError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            InventoryError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
            InventoryError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            InventoryError::Store(e) => store_error_to_response(e),
        }
    }
}

impl ErrorResponse for SchedulingError {
    fn into_error_response(self) -> Response {
        let message = self.to_string();
        match self {
            SchedulingError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            SchedulingError::UnknownPatient(_) => {
                json_error(StatusCode::BAD_REQUEST, "unknown_patient", message)
            }
            SchedulingError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
            SchedulingError::SlotTaken { .. } => json_error(StatusCode::CONFLICT, "slot_taken", message),
            SchedulingError::Store(e) => store_error_to_response(e),
        }
    }
}

impl ErrorResponse for PurchasingError {
    fn into_error_response(self) -> Response {
        match self {
            PurchasingError::Domain(e) => domain_error_to_response(e),
            PurchasingError::Store(e) => store_error_to_response(e),
        }
    }
}

impl ErrorResponse for PatientError {
    fn into_error_response(self) -> Response {
        match self {
            PatientError::Domain(e) => domain_error_to_response(e),
            PatientError::Store(e) => store_error_to_response(e),
        }
    }
}

impl ErrorResponse for DomainError {
    fn into_error_response(self) -> Response {
        domain_error_to_response(self)
    }
}

/// Parse a path or query parameter, answering 400 when it is malformed.
pub fn parse_param<T>(raw: &str) -> Result<T, Response>
where
    T: std::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(domain_error_to_response)
}

pub fn not_found(what: &str) -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
}
