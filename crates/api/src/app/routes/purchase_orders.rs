use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};

use clinic_core::{DomainError, MedicationId, PurchaseOrderId};
use clinic_purchasing::{PurchaseOrderStatus, PurchasingError};

use crate::app::dto::{PurchaseOrderQuery, StatusRequest};
use crate::app::errors;
use crate::app::services::{respond, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", post(set_status))
        .route("/:id/receive", post(receive))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<PurchaseOrderQuery>,
) -> Response {
    let medication_id = match query.medication_id.as_deref().map(errors::parse_param::<MedicationId>) {
        Some(Ok(id)) => Some(id),
        Some(Err(resp)) => return resp,
        None => None,
    };
    respond(&services, StatusCode::OK, move |s| match medication_id {
        Some(id) => s.purchasing.orders_for(id),
        None => s.purchasing.orders(),
    })
    .await
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: PurchaseOrderId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| {
        s.purchasing
            .order(id)
            .and_then(|o| o.ok_or(PurchasingError::Domain(DomainError::NotFound)))
    })
    .await
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Response {
    let id: PurchaseOrderId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let to: PurchaseOrderStatus = match errors::parse_param(&body.status) {
        Ok(status) => status,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.purchasing.set_status(id, to)).await
}

/// Mark the order received and add its quantity to stock.
pub async fn receive(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: PurchaseOrderId = match errors::parse_param(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    respond(&services, StatusCode::OK, move |s| s.inventory.receive_purchase_order(id)).await
}
