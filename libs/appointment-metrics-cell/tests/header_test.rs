use std::sync::{Arc, Mutex};

use serde_json::json;

use appointment_metrics_cell::models::{HeaderProps, ServiceFilter, ServiceType};
use appointment_metrics_cell::services::header::{resolve_selected, selector_items};
use appointment_metrics_cell::services::{AppointmentsHeader, AppointmentsHeaderService};
use shared_models::error::FetchError;
use shared_openmrs::QueryClient;
use shared_utils::test_utils::{MockOpenmrsResponses, StaticFetcher, TestConfig};

fn service_types() -> Vec<ServiceType> {
    vec![
        ServiceType { uuid: "svc-dental".to_string(), name: "Dental".to_string() },
        ServiceType { uuid: "svc-general".to_string(), name: "General".to_string() },
    ]
}

fn recording_filter() -> (ServiceFilter, Arc<Mutex<Vec<String>>>) {
    let selections = Arc::new(Mutex::new(Vec::new()));
    let sink = selections.clone();
    let filter = ServiceFilter::enabled(move |uuid| sink.lock().unwrap().push(uuid.to_string()));
    (filter, selections)
}

#[test]
fn test_header_without_handler_has_no_selector() {
    let props = HeaderProps::new("Appointments").with_service_type("svc-dental");
    let view = AppointmentsHeader::new(props, service_types()).view();

    assert_eq!(view.title, "Appointments");
    assert_eq!(view.pictogram, "appointments");
    assert_eq!(view.test_id, "appointments-header");
    assert!(view.selector.is_none());
}

#[test]
fn test_selector_items_start_with_all() {
    let (filter, _) = recording_filter();
    let props = HeaderProps::new("Appointments").with_filter(filter);
    let view = AppointmentsHeader::new(props, service_types()).view();

    let selector = view.selector.expect("selector rendered");
    assert_eq!(selector.id, "serviceDropdown");
    assert_eq!(selector.label, "Select service type");
    assert_eq!(selector.title_text, "View");
    assert_eq!(selector.items.len(), 3);
    assert_eq!(selector.items[0], ServiceType::all());
    assert_eq!(selector.items[1].name, "Dental");
    assert_eq!(selector.items[2].name, "General");
}

#[test]
fn test_selected_item_matches_current_service() {
    let (filter, _) = recording_filter();
    let props = HeaderProps::new("Appointments")
        .with_service_type("svc-general")
        .with_filter(filter);
    let view = AppointmentsHeader::new(props, service_types()).view();

    assert_eq!(view.selector.unwrap().selected.uuid, "svc-general");
}

#[test]
fn test_unmatched_service_type_defaults_to_all() {
    let services = service_types();

    assert!(resolve_selected(&services, Some("svc-unknown")).is_all());
    assert!(resolve_selected(&services, Some("")).is_all());
    assert!(resolve_selected(&services, None).is_all());
    assert!(resolve_selected(&[], Some("svc-dental")).is_all());
    assert_eq!(selector_items(&[]), vec![ServiceType::all()]);
}

#[test]
fn test_selection_invokes_handler_with_identifier() {
    let (filter, selections) = recording_filter();
    let header = AppointmentsHeader::new(HeaderProps::new("Appointments").with_filter(filter), service_types());

    assert!(header.select(&service_types()[0]));
    assert!(header.select(&ServiceType::all()));

    assert_eq!(
        *selections.lock().unwrap(),
        vec!["svc-dental".to_string(), String::new()]
    );
}

#[test]
fn test_selection_without_handler_is_ignored() {
    let header = AppointmentsHeader::new(HeaderProps::new("Appointments"), service_types());
    assert!(!header.select(&service_types()[0]));
}

#[tokio::test]
async fn test_header_service_loads_service_types() {
    let fetcher = Arc::new(StaticFetcher::new());
    let config = TestConfig::default().to_app_config();
    fetcher.respond(
        &config.rest_url("/appointmentService/all/full"),
        json!([
            MockOpenmrsResponses::service_type("svc-dental", "Dental"),
            MockOpenmrsResponses::service_type("svc-lab", "Lab"),
        ]),
    );
    let client = Arc::new(QueryClient::from_config(fetcher.clone(), &config));
    let service = AppointmentsHeaderService::new(client, &config);

    let (filter, _) = recording_filter();
    let header = service
        .render(HeaderProps::new("Appointments").with_service_type("svc-lab").with_filter(filter))
        .await;
    let selector = header.view().selector.unwrap();

    assert_eq!(selector.items.len(), 3);
    assert_eq!(selector.selected.name, "Lab");
}

#[tokio::test]
async fn test_header_service_skips_fetch_without_filter() {
    let fetcher = Arc::new(StaticFetcher::new());
    let config = TestConfig::default().to_app_config();
    let client = Arc::new(QueryClient::from_config(fetcher.clone(), &config));
    let service = AppointmentsHeaderService::new(client, &config);

    let header = service.render(HeaderProps::new("Appointments")).await;

    assert!(header.view().selector.is_none());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_header_service_falls_back_to_all_on_error() {
    let fetcher = Arc::new(StaticFetcher::new());
    let config = TestConfig::default().to_app_config();
    fetcher.fail(
        &config.rest_url("/appointmentService/all/full"),
        FetchError::Network("refused".to_string()),
    );
    let client = Arc::new(QueryClient::from_config(fetcher.clone(), &config));
    let service = AppointmentsHeaderService::new(client, &config);

    let (filter, _) = recording_filter();
    let header = service
        .render(HeaderProps::new("Appointments").with_filter(filter))
        .await;

    assert_eq!(header.view().selector.unwrap().items, vec![ServiceType::all()]);
}
