use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_metrics_cell::{appointment_metrics_routes, AppState};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Appointments dashboard API is running!" }))
        .nest("/appointments", appointment_metrics_routes(state))
}
