use axum::{routing::get, Router};

pub mod appointments;
pub mod doctors;
pub mod medications;
pub mod patients;
pub mod prescriptions;
pub mod purchase_orders;
pub mod system;

/// Router for every clinic endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/notifications", get(system::notifications))
        .nest("/patients", patients::router())
        .nest("/medications", medications::router())
        .nest("/prescriptions", prescriptions::router())
        .nest("/purchase-orders", purchase_orders::router())
        .nest("/appointments", appointments::router())
        .nest("/doctors", doctors::router())
}
