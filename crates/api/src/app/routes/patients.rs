use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};

use clinic_core::{DomainError, PatientId};
use clinic_patients::{NewPatient, PatientError, PatientUpdate};

use crate::app::dto::PatientSummary;
use crate::app::errors;
use crate::app::services::{respond, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_patients).post(register_patient))
        .route("/:id", get(get_patient).put(update_patient))
        .route("/:id/appointments", get(patient_appointments))
}

pub async fn register_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<NewPatient>,
) -> Response {
    respond(&services, StatusCode::CREATED, move |s| s.patients.register(body)).await
}

/// Registration numbers are masked in the list view.
pub async fn list_patients(Extension(services): Extension<Arc<AppServices>>) -> Response {
    respond(&services, StatusCode::OK, |s| {
        s.patients
            .patients()
            .map(|list| list.iter().map(PatientSummary::from).collect::<Vec<_>>())
    })
    .await
}

pub async fn get_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: PatientId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.patients
            .patient(id)
            .and_then(|p| p.ok_or(PatientError::Domain(DomainError::NotFound)))
    })
    .await
}

pub async fn update_patient(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<PatientUpdate>,
) -> Response {
    let id: PatientId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.patients.update(id, body)).await
}

pub async fn patient_appointments(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: PatientId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.scheduling.appointments_for_patient(id)).await
}
