use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};

use crate::app::dto::PrescriptionRequest;
use crate::app::services::{respond, AppServices};

pub fn router() -> Router {
    Router::new().route("/", post(consume))
}

/// Dispense against stock; may raise a purchase order.
pub async fn consume(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<PrescriptionRequest>,
) -> Response {
    respond(&services, StatusCode::OK, move |s| {
        s.inventory.consume_on_prescription(body.medication_id, body.quantity)
    })
    .await
}
