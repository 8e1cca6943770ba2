use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, Json};

use crate::app::dto::NoticesView;
use crate::app::services::AppServices;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "backend": services.backend(),
    }))
}

/// Reorder notices raised since startup, newest first.
pub async fn notifications(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    let notices = services.notices.recent();
    Json(NoticesView {
        count: notices.len(),
        notices,
    })
}
