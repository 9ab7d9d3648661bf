// libs/appointment-metrics-cell/src/services/scheduled.rs
use std::sync::Arc;

use tracing::instrument;

use shared_config::AppConfig;
use shared_openmrs::{QueryClient, QueryObserver, QueryResult};

use crate::models::{Appointment, ScheduledAppointments, SelectedDate};
use crate::services::aggregation::count_scheduled;
use crate::services::all_appointments_url;

pub struct ScheduledAppointmentsService {
    observer: QueryObserver,
    config: AppConfig,
}

impl ScheduledAppointmentsService {
    pub fn new(client: Arc<QueryClient>, config: &AppConfig) -> Self {
        Self {
            observer: QueryObserver::new(client),
            config: config.clone(),
        }
    }

    /// Appointments on `date`, restricted to `service_ids` unless it is empty.
    #[instrument(skip(self, date), fields(date = %date))]
    pub async fn load(&self, date: &SelectedDate, service_ids: &[String]) -> ScheduledAppointments {
        let url = all_appointments_url(&self.config, date);
        let result = self.observer.observe(&url).await;
        Self::from_query(&result, service_ids)
    }

    pub async fn current(&self, service_ids: &[String]) -> ScheduledAppointments {
        Self::from_query(&self.observer.current().await, service_ids)
    }

    fn from_query(result: &QueryResult, service_ids: &[String]) -> ScheduledAppointments {
        let (appointments, error) = result.decode::<Vec<Appointment>>();

        ScheduledAppointments {
            is_loading: result.is_loading,
            error,
            total_scheduled_appointments: appointments
                .as_deref()
                .map(|appointments| count_scheduled(appointments, service_ids))
                .unwrap_or(0),
        }
    }
}
