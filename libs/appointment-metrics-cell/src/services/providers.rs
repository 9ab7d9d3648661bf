// libs/appointment-metrics-cell/src/services/providers.rs
use std::sync::Arc;

use tracing::{info, instrument};

use shared_config::AppConfig;
use shared_openmrs::{QueryClient, QueryObserver, QueryResult};

use crate::models::{Appointment, ProviderMetrics, SelectedDate};
use crate::services::aggregation::unique_accepted_providers;
use crate::services::all_appointments_url;

pub struct ProviderMetricsService {
    observer: QueryObserver,
    config: AppConfig,
}

impl ProviderMetricsService {
    pub fn new(client: Arc<QueryClient>, config: &AppConfig) -> Self {
        Self {
            observer: QueryObserver::new(client),
            config: config.clone(),
        }
    }

    pub fn appointments_url(&self, date: &SelectedDate) -> String {
        all_appointments_url(&self.config, date)
    }

    #[instrument(skip(self, date), fields(date = %date))]
    pub async fn load(&self, date: &SelectedDate) -> ProviderMetrics {
        let result = self.observer.observe(&self.appointments_url(date)).await;
        Self::from_query(&result)
    }

    pub async fn current(&self) -> ProviderMetrics {
        Self::from_query(&self.observer.current().await)
    }

    /// Re-fetch the most recently loaded date.
    #[instrument(skip(self))]
    pub async fn mutate(&self) -> ProviderMetrics {
        info!("Revalidating appointments for provider count");
        Self::from_query(&self.observer.mutate().await)
    }

    /// Load `date` straight from the network, skipping any cached response.
    #[instrument(skip(self, date), fields(date = %date))]
    pub async fn refresh(&self, date: &SelectedDate) -> ProviderMetrics {
        info!("Refreshing appointments for provider count");
        Self::from_query(&self.observer.refresh(&self.appointments_url(date)).await)
    }

    fn from_query(result: &QueryResult) -> ProviderMetrics {
        let (appointments, error) = result.decode::<Vec<Appointment>>();
        let total_providers = appointments
            .as_deref()
            .map(|appointments| unique_accepted_providers(appointments).len())
            .unwrap_or(0);

        ProviderMetrics {
            total_providers,
            is_loading: result.is_loading,
            error,
            is_validating: result.is_validating,
        }
    }
}
