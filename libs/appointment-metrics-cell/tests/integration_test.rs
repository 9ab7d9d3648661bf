// =====================================================================================
// APPOINTMENT METRICS CELL INTEGRATION TESTS - ROUTER AGAINST A MOCK OPENMRS
// =====================================================================================

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_metrics_cell::{appointment_metrics_routes, AppState};
use shared_utils::test_utils::{MockOpenmrsResponses, TestConfig};

const REST_BASE: &str = "/openmrs/ws/rest/v1";

async fn setup_router(mock_server: &MockServer) -> Router {
    let config = TestConfig::with_url(&mock_server.uri()).to_app_config();
    appointment_metrics_routes(Arc::new(AppState::from_config(config)))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

async fn mount_appointments(mock_server: &MockServer, for_date: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{}/appointment/all", REST_BASE)))
        .and(query_param("forDate", for_date))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_metrics_endpoint_requests_day_bounds() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/appointment/appointmentSummary", REST_BASE)))
        .and(query_param("startDate", "2024-05-10T00:00:00.000+0000"))
        .and(query_param("endDate", "2024-05-10T23:59:59.999+0000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockOpenmrsResponses::appointment_summary("svc-dental", "Dental", 6, 2),
            MockOpenmrsResponses::appointment_summary("svc-lab", "Lab", 1, 0),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = setup_router(&mock_server).await;
    let (status, json) = get_json(app, "/metrics?date=2024-05-10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_appointments"], 7);
    assert_eq!(json["missed_appointments"], 2);
    assert_eq!(json["highest_service_load"]["service_name"], "Dental");
    assert_eq!(json["is_loading"], false);
    assert!(json["error"].is_null());
}

#[tokio::test]
async fn test_metrics_endpoint_rejects_bad_date() {
    let mock_server = MockServer::start().await;
    let app = setup_router(&mock_server).await;

    let (status, json) = get_json(app, "/metrics?date=10-05-2024").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("10-05-2024"));
}

#[tokio::test]
async fn test_metrics_endpoint_rejects_date_beyond_representable_range() {
    let mock_server = MockServer::start().await;
    let config = TestConfig {
        utc_offset_minutes: -60,
        ..TestConfig::with_url(&mock_server.uri())
    }
    .to_app_config();
    let app = appointment_metrics_routes(Arc::new(AppState::from_config(config)));

    let (status, json) = get_json(app, "/metrics?date=%2B262142-12-31").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("262142-12-31"));
}

#[tokio::test]
async fn test_upstream_failure_maps_to_bad_gateway() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/appointment/appointmentSummary", REST_BASE)))
        .respond_with(ResponseTemplate::new(500).set_body_json(
            MockOpenmrsResponses::error_body("Unable to compute summary"),
        ))
        .mount(&mock_server)
        .await;

    let app = setup_router(&mock_server).await;
    let (status, json) = get_json(app, "/metrics?date=2024-05-10").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json["error"].as_str().unwrap().contains("Unable to compute summary"));
}

#[tokio::test]
async fn test_providers_endpoint_counts_unique_accepted() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/appointment/all", REST_BASE)))
        .and(query_param("forDate", "2024-05-10T00:00:00.000+0000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockOpenmrsResponses::appointment("svc-a", "A", &[("p1", "ACCEPTED"), ("p2", "AWAITING")]),
            MockOpenmrsResponses::appointment("svc-b", "B", &[("p1", "ACCEPTED"), ("p3", "ACCEPTED")]),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = setup_router(&mock_server).await;
    let (status, json) = get_json(app, "/providers?date=2024-05-10&refresh=true").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_providers"], 2);
    assert_eq!(json["is_validating"], false);
}

#[tokio::test]
async fn test_scheduled_endpoint_filters_services() {
    let mock_server = MockServer::start().await;
    mount_appointments(&mock_server, "2024-05-10T00:00:00.000+0000", json!([
        MockOpenmrsResponses::appointment("A", "Dental", &[]),
        MockOpenmrsResponses::appointment("B", "General", &[]),
        MockOpenmrsResponses::appointment("A", "Dental", &[]),
        MockOpenmrsResponses::appointment("C", "Lab", &[]),
    ]))
    .await;

    let app = setup_router(&mock_server).await;
    let (status, json) = get_json(app.clone(), "/scheduled?date=2024-05-10&services=A,C").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_scheduled_appointments"], 3);

    let (_, json) = get_json(app, "/scheduled?date=2024-05-10").await;
    assert_eq!(json["total_scheduled_appointments"], 4);
}

#[tokio::test]
async fn test_header_endpoint_describes_selector() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/appointmentService/all/full", REST_BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockOpenmrsResponses::service_type("svc-dental", "Dental"),
        ])))
        .mount(&mock_server)
        .await;

    let app = setup_router(&mock_server).await;
    let (status, json) = get_json(app.clone(), "/header?title=Clinic&service_type=svc-dental").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["title"], "Clinic");
    assert_eq!(json["selector"]["items"][0]["name"], "All");
    assert_eq!(json["selector"]["selected"]["uuid"], "svc-dental");

    let (_, json) = get_json(app, "/header?filterable=false").await;
    assert_eq!(json["title"], "Appointments");
    assert!(json["selector"].is_null());
}

#[tokio::test]
async fn test_service_types_endpoint() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/appointmentService/all/full", REST_BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockOpenmrsResponses::service_type("svc-dental", "Dental"),
            MockOpenmrsResponses::service_type("svc-lab", "Lab"),
        ])))
        .mount(&mock_server)
        .await;

    let app = setup_router(&mock_server).await;
    let (status, json) = get_json(app, "/service-types").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["service_types"].as_array().unwrap().len(), 2);
    assert_eq!(json["service_types"][1]["uuid"], "svc-lab");
}
