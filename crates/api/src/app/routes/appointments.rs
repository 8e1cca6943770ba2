use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use clinic_core::AppointmentId;
use clinic_scheduling::{BookingRequest, SchedulingError};

use crate::app::errors;
use crate::app::services::{respond, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", post(book))
        .route("/:id", get(get_appointment).put(update_appointment))
        .route("/:id/cancel", post(cancel))
}

pub async fn book(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<BookingRequest>,
) -> Response {
    respond(&services, StatusCode::CREATED, move |s| s.scheduling.book(&body)).await
}

pub async fn get_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: AppointmentId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.scheduling
            .appointment(id)
            .and_then(|a| a.ok_or(SchedulingError::NotFound))
    })
    .await
}

pub async fn update_appointment(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<BookingRequest>,
) -> Response {
    let id: AppointmentId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.scheduling.update(id, &body)).await
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: AppointmentId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.scheduling.cancel(id)).await
}
