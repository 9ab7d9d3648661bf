// libs/appointment-metrics-cell/src/services/header.rs
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use shared_config::AppConfig;
use shared_openmrs::QueryClient;

use crate::models::{HeaderProps, HeaderView, ServiceFilter, ServiceSelectorView, ServiceType};
use crate::services::service_types::ServiceTypesService;

pub const HEADER_TEST_ID: &str = "appointments-header";
pub const HEADER_PICTOGRAM: &str = "appointments";
pub const SELECTOR_ID: &str = "serviceDropdown";
pub const SELECTOR_LABEL: &str = "Select service type";
pub const SELECTOR_TITLE: &str = "View";

/// Selector entries: the synthetic "All" first, then the services as listed.
pub fn selector_items(service_types: &[ServiceType]) -> Vec<ServiceType> {
    std::iter::once(ServiceType::all())
        .chain(service_types.iter().cloned())
        .collect()
}

/// The service matching `current`, or "All" when nothing matches.
pub fn resolve_selected(service_types: &[ServiceType], current: Option<&str>) -> ServiceType {
    current
        .and_then(|uuid| service_types.iter().find(|service| service.uuid == uuid))
        .cloned()
        .unwrap_or_else(ServiceType::all)
}

pub struct AppointmentsHeader {
    props: HeaderProps,
    service_types: Vec<ServiceType>,
}

impl AppointmentsHeader {
    pub fn new(props: HeaderProps, service_types: Vec<ServiceType>) -> Self {
        Self { props, service_types }
    }

    pub fn view(&self) -> HeaderView {
        let selector = match &self.props.filter {
            ServiceFilter::Disabled => None,
            ServiceFilter::Enabled(_) => Some(ServiceSelectorView {
                id: SELECTOR_ID,
                aria_label: SELECTOR_LABEL,
                label: SELECTOR_LABEL,
                title_text: SELECTOR_TITLE,
                items: selector_items(&self.service_types),
                selected: resolve_selected(
                    &self.service_types,
                    self.props.appointment_service_type.as_deref(),
                ),
            }),
        };

        HeaderView {
            test_id: HEADER_TEST_ID,
            title: self.props.title.clone(),
            pictogram: HEADER_PICTOGRAM,
            selector,
        }
    }

    /// Hand `item`'s identifier to the change handler. Returns `false` when
    /// the header has no selector.
    pub fn select(&self, item: &ServiceType) -> bool {
        match &self.props.filter {
            ServiceFilter::Enabled(on_change) => {
                debug!("Service type selected: '{}'", item.uuid);
                on_change(&item.uuid);
                true
            }
            ServiceFilter::Disabled => false,
        }
    }
}

/// Builds headers backed by the server's service list.
pub struct AppointmentsHeaderService {
    service_types: ServiceTypesService,
}

impl AppointmentsHeaderService {
    pub fn new(client: Arc<QueryClient>, config: &AppConfig) -> Self {
        Self {
            service_types: ServiceTypesService::new(client, config),
        }
    }

    #[instrument(skip(self, props), fields(title = %props.title))]
    pub async fn render(&self, props: HeaderProps) -> AppointmentsHeader {
        // Only the selector needs the service list.
        if !props.filter.is_enabled() {
            return AppointmentsHeader::new(props, Vec::new());
        }

        let loaded = self.service_types.load().await;
        if loaded.error.is_some() {
            warn!("Rendering service selector with only the 'All' entry");
        }

        AppointmentsHeader::new(props, loaded.service_types)
    }
}
