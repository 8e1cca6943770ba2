use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Router,
};
use serde_json::json;

use clinic_core::AppointmentId;
use clinic_scheduling::SchedulingError;

use crate::app::dto::{self, AvailabilityQuery, AvailabilityView, DateQuery};
use crate::app::errors::{self, ErrorResponse};
use crate::app::services::{respond, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_doctors))
        .route("/:name/slots", get(slots))
        .route("/:name/schedule", get(schedule))
        .route("/:name/availability", get(availability))
}

pub async fn list_doctors(Extension(services): Extension<Arc<AppServices>>) -> Response {
    respond(&services, StatusCode::OK, |s| s.scheduling.doctors()).await
}

pub async fn slots(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Query(query): Query<DateQuery>,
) -> Response {
    respond(&services, StatusCode::OK, move |s| {
        s.scheduling.available_slots(&name, query.date).map(|slots| {
            json!({
                "doctor": name.trim(),
                "date": query.date,
                "slots": slots,
            })
        })
    })
    .await
}

pub async fn schedule(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Query(query): Query<DateQuery>,
) -> Response {
    respond(&services, StatusCode::OK, move |s| s.scheduling.day_schedule(&name, query.date)).await
}

pub async fn availability(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Response {
    let at = match dto::parse_date_time(&query.at) {
        Ok(at) => at,
        Err(e) => return SchedulingError::from(e).into_error_response(),
    };
    let exclude = match query.exclude.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(raw) => match errors::parse_param::<AppointmentId>(raw) {
            Ok(id) => Some(id),
            Err(resp) => return resp,
        },
        None => None,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.scheduling
            .is_slot_available(&name, at, exclude)
            .map(|available| AvailabilityView {
                doctor: name.trim().to_string(),
                at,
                available,
            })
    })
    .await
}
