// libs/appointment-metrics-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use shared_models::error::AppError;

use crate::models::{
    ClinicalMetrics, HeaderProps, HeaderView, ProviderMetrics, ScheduledAppointments,
    ServiceFilter, ServiceTypes,
};
use crate::services::{
    AppointmentsHeaderService, ClinicalMetricsService, ProviderMetricsService,
    ScheduledAppointmentsService, ServiceTypesService,
};
use crate::state::AppState;

const DEFAULT_HEADER_TITLE: &str = "Appointments";

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProvidersQuery {
    pub date: Option<String>,
    pub refresh: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduledQuery {
    pub date: Option<String>,
    /// Comma separated service uuids.
    pub services: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HeaderQuery {
    pub title: Option<String>,
    pub service_type: Option<String>,
    pub filterable: Option<bool>,
}

fn parse_service_ids(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

// ==============================================================================
// HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_clinical_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Result<Json<ClinicalMetrics>, AppError> {
    let date = state.selected_date(query.date.as_deref())?;

    let service = ClinicalMetricsService::new(state.query_client.clone(), &state.config);
    let metrics = service.load(&date).await;

    if let Some(err) = &metrics.error {
        return Err(err.clone().into());
    }

    Ok(Json(metrics))
}

#[axum::debug_handler]
pub async fn get_provider_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProvidersQuery>,
) -> Result<Json<ProviderMetrics>, AppError> {
    let date = state.selected_date(query.date.as_deref())?;

    let service = ProviderMetricsService::new(state.query_client.clone(), &state.config);
    let metrics = if query.refresh.unwrap_or(false) {
        debug!("Provider metrics refresh requested for {}", date);
        service.refresh(&date).await
    } else {
        service.load(&date).await
    };

    if let Some(err) = &metrics.error {
        return Err(err.clone().into());
    }

    Ok(Json(metrics))
}

#[axum::debug_handler]
pub async fn get_scheduled_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScheduledQuery>,
) -> Result<Json<ScheduledAppointments>, AppError> {
    let date = state.selected_date(query.date.as_deref())?;
    let service_ids = parse_service_ids(query.services.as_deref());

    let service = ScheduledAppointmentsService::new(state.query_client.clone(), &state.config);
    let scheduled = service.load(&date, &service_ids).await;

    if let Some(err) = &scheduled.error {
        return Err(err.clone().into());
    }

    Ok(Json(scheduled))
}

#[axum::debug_handler]
pub async fn get_service_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ServiceTypes>, AppError> {
    let service = ServiceTypesService::new(state.query_client.clone(), &state.config);
    let service_types = service.load().await;

    if let Some(err) = &service_types.error {
        return Err(err.clone().into());
    }

    Ok(Json(service_types))
}

/// Header view-model. Selection happens in the browser, so an enabled
/// filter here only decides whether the selector is described.
#[axum::debug_handler]
pub async fn get_header(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HeaderQuery>,
) -> Json<HeaderView> {
    let mut props = HeaderProps::new(
        query.title.unwrap_or_else(|| DEFAULT_HEADER_TITLE.to_string()),
    );
    if let Some(service_type) = query.service_type {
        props = props.with_service_type(service_type);
    }
    if query.filterable.unwrap_or(true) {
        props = props.with_filter(ServiceFilter::enabled(|_| {}));
    }

    let service = AppointmentsHeaderService::new(state.query_client.clone(), &state.config);
    let header = service.render(props).await;

    Json(header.view())
}
