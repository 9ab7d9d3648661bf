// libs/appointment-metrics-cell/src/services/clinical_metrics.rs
use std::sync::Arc;

use tracing::{debug, instrument};

use shared_config::AppConfig;
use shared_openmrs::{QueryClient, QueryObserver, QueryResult};

use crate::models::{
    AppointmentSummary, ClinicalMetrics, SelectedDate, ALL_APPOINTMENTS_COUNT,
    MISSED_APPOINTMENTS_COUNT,
};
use crate::services::aggregation::{flatten_summary, highest_service_load, service_count_by_type};

/// Day totals, missed count and busiest service from the appointment summary.
pub struct ClinicalMetricsService {
    observer: QueryObserver,
    config: AppConfig,
}

impl ClinicalMetricsService {
    pub fn new(client: Arc<QueryClient>, config: &AppConfig) -> Self {
        Self {
            observer: QueryObserver::new(client),
            config: config.clone(),
        }
    }

    pub fn summary_url(&self, date: &SelectedDate) -> String {
        let start = date.format(&self.config.date_format);
        let end = date.format_end_of_day(&self.config.date_format);
        format!(
            "{}?startDate={}&endDate={}",
            self.config.rest_url("/appointment/appointmentSummary"),
            urlencoding::encode(&start),
            urlencoding::encode(&end)
        )
    }

    #[instrument(skip(self, date), fields(date = %date))]
    pub async fn load(&self, date: &SelectedDate) -> ClinicalMetrics {
        let result = self.observer.observe(&self.summary_url(date)).await;
        let metrics = Self::from_query(&result);
        debug!(
            "Clinical metrics: {} total, {} missed",
            metrics.total_appointments, metrics.missed_appointments
        );
        metrics
    }

    /// Metrics for the most recently loaded date.
    pub async fn current(&self) -> ClinicalMetrics {
        Self::from_query(&self.observer.current().await)
    }

    fn from_query(result: &QueryResult) -> ClinicalMetrics {
        let (summaries, error) = result.decode::<Vec<AppointmentSummary>>();
        let summaries = summaries.unwrap_or_default();
        let flattened = flatten_summary(&summaries);

        ClinicalMetrics {
            is_loading: result.is_loading,
            error,
            total_appointments: service_count_by_type(&summaries, ALL_APPOINTMENTS_COUNT),
            missed_appointments: service_count_by_type(&summaries, MISSED_APPOINTMENTS_COUNT),
            highest_service_load: highest_service_load(&flattened),
        }
    }
}
