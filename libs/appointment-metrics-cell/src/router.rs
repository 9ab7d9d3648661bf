// libs/appointment-metrics-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use crate::handlers;
use crate::state::AppState;

pub fn appointment_metrics_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/metrics", get(handlers::get_clinical_metrics))
        .route("/providers", get(handlers::get_provider_metrics))
        .route("/scheduled", get(handlers::get_scheduled_appointments))
        .route("/service-types", get(handlers::get_service_types))
        .route("/header", get(handlers::get_header))
        .with_state(state)
}
