use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use clinic_core::MedicationId;
use clinic_inventory::{InventoryError, MedicationUpdate};

use crate::app::dto::{PreviewQuery, QuantityRequest, RegisterMedicationRequest, StockView};
use crate::app::errors;
use crate::app::services::{respond, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_medications).post(register_medication))
        .route("/low-stock", get(low_stock))
        .route("/:id", get(get_medication).put(update_medication))
        .route("/:id/stock", get(get_stock).put(set_stock))
        .route("/:id/restock", post(restock))
        .route("/:id/thresholds", get(thresholds))
        .route("/:id/preview", get(preview))
}

fn medication_id(raw: &str) -> Result<MedicationId, Response> {
    errors::parse_param(raw)
}

pub async fn register_medication(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterMedicationRequest>,
) -> Response {
    respond(&services, StatusCode::CREATED, move |s| {
        s.inventory.register_medication(body.medication, body.initial_stock)
    })
    .await
}

pub async fn list_medications(Extension(services): Extension<Arc<AppServices>>) -> Response {
    respond(&services, StatusCode::OK, |s| s.inventory.medications()).await
}

pub async fn low_stock(Extension(services): Extension<Arc<AppServices>>) -> Response {
    respond(&services, StatusCode::OK, |s| s.inventory.low_stock()).await
}

pub async fn get_medication(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match medication_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.inventory
            .medication(id)
            .and_then(|m| m.ok_or(InventoryError::NotFound))
    })
    .await
}

pub async fn update_medication(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<MedicationUpdate>,
) -> Response {
    let id = match medication_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.inventory.update_medication(id, body)).await
}

/// Unknown medications read as zero stock.
pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match medication_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.inventory.current_stock(id).map(|quantity| StockView {
            medication_id: id,
            quantity,
        })
    })
    .await
}

pub async fn set_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<QuantityRequest>,
) -> Response {
    let id = match medication_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.inventory.set_stock(id, body.quantity).map(|quantity| StockView {
            medication_id: id,
            quantity,
        })
    })
    .await
}

pub async fn restock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<QuantityRequest>,
) -> Response {
    let id = match medication_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.inventory.restock(id, body.quantity).map(|quantity| StockView {
            medication_id: id,
            quantity,
        })
    })
    .await
}

pub async fn thresholds(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id = match medication_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.inventory.check_thresholds(id)).await
}

pub async fn preview(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(query): Query<PreviewQuery>,
) -> Response {
    let id = match medication_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.inventory.preview_prescription(id, query.quantity)
    })
    .await
}
