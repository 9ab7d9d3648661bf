// libs/appointment-metrics-cell/src/services/service_types.rs
use std::sync::Arc;

use tracing::{instrument, warn};

use shared_config::AppConfig;
use shared_openmrs::{QueryClient, QueryObserver};

use crate::models::{ServiceType, ServiceTypes};

/// The appointment services configured on the server.
pub struct ServiceTypesService {
    observer: QueryObserver,
    url: String,
}

impl ServiceTypesService {
    pub fn new(client: Arc<QueryClient>, config: &AppConfig) -> Self {
        Self {
            observer: QueryObserver::new(client),
            url: config.rest_url("/appointmentService/all/full"),
        }
    }

    #[instrument(skip(self))]
    pub async fn load(&self) -> ServiceTypes {
        let result = self.observer.observe(&self.url).await;
        let (service_types, error) = result.decode::<Vec<ServiceType>>();

        if let Some(err) = &error {
            warn!("Could not load appointment services: {}", err);
        }

        ServiceTypes {
            service_types: service_types.unwrap_or_default(),
            is_loading: result.is_loading,
            error,
        }
    }
}
