use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};
use serde_json::{json, Value};
use tokio::sync::Notify;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::FetchError;
use shared_openmrs::{FetchResponse, Fetcher};

pub struct TestConfig {
    pub openmrs_url: String,
    pub rest_base_url: String,
    pub utc_offset_minutes: i32,
    pub dedupe_interval_ms: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            openmrs_url: "http://localhost:8080".to_string(),
            rest_base_url: "/openmrs/ws/rest/v1".to_string(),
            utc_offset_minutes: 0,
            // Long enough that a test never sees an entry expire.
            dedupe_interval_ms: 60_000,
        }
    }
}

impl TestConfig {
    pub fn with_url(url: &str) -> Self {
        Self {
            openmrs_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            openmrs_url: self.openmrs_url.clone(),
            rest_base_url: self.rest_base_url.clone(),
            utc_offset_minutes: self.utc_offset_minutes,
            dedupe_interval_ms: self.dedupe_interval_ms,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub fn test_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("UTC offset")
}

/// JSON bodies shaped like the OpenMRS appointments module returns them.
pub struct MockOpenmrsResponses;

impl MockOpenmrsResponses {
    pub fn appointment_summary(service_uuid: &str, service_name: &str, all: u64, missed: u64) -> Value {
        json!({
            "appointmentService": {
                "appointmentServiceId": 1,
                "uuid": service_uuid,
                "name": service_name,
                "color": "#00ff00",
                "durationMins": 15
            },
            "appointmentCountMap": {
                "2024-05-10": {
                    "allAppointmentsCount": all,
                    "missedAppointmentsCount": missed,
                    "appointmentDate": 1715299200000u64,
                    "appointmentServiceUuid": service_uuid
                }
            }
        })
    }

    /// `providers` are `(uuid, response)` pairs.
    pub fn appointment(service_uuid: &str, service_name: &str, providers: &[(&str, &str)]) -> Value {
        let providers: Vec<Value> = providers
            .iter()
            .map(|(uuid, response)| json!({
                "uuid": uuid,
                "name": format!("Provider {}", uuid),
                "response": response,
                "comments": null
            }))
            .collect();

        json!({
            "uuid": Uuid::new_v4().to_string(),
            "appointmentNumber": "0000",
            "patient": { "uuid": Uuid::new_v4().to_string(), "name": "Test Patient" },
            "service": { "uuid": service_uuid, "name": service_name },
            "providers": providers,
            "startDateTime": 1715331600000i64,
            "endDateTime": 1715333400000i64,
            "status": "Scheduled",
            "appointmentKind": "Scheduled",
            "comments": null
        })
    }

    pub fn service_type(uuid: &str, name: &str) -> Value {
        json!({
            "appointmentServiceId": 1,
            "uuid": uuid,
            "name": name,
            "description": null,
            "durationMins": 30,
            "color": "#ff0000",
            "weeklyAvailability": []
        })
    }

    pub fn error_body(message: &str) -> Value {
        json!({
            "error": { "message": message, "code": "" }
        })
    }
}

enum Route {
    Ready(Result<FetchResponse, FetchError>),
    Gated(Result<FetchResponse, FetchError>, Arc<Notify>),
}

/// In-memory [`Fetcher`] with canned responses per URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    routes: Mutex<HashMap<String, Route>>,
    calls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, data: Value) -> &Self {
        self.insert(url, Route::Ready(Ok(FetchResponse::ok(data))))
    }

    pub fn fail(&self, url: &str, error: FetchError) -> &Self {
        self.insert(url, Route::Ready(Err(error)))
    }

    /// Respond with `data` only after the returned handle is notified.
    pub fn respond_after(&self, url: &str, data: Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.insert(url, Route::Gated(Ok(FetchResponse::ok(data)), gate.clone()));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|called| called.as_str() == url).count()
    }

    fn insert(&self, url: &str, route: Route) -> &Self {
        self.routes.lock().expect("routes lock").insert(url.to_string(), route);
        self
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.lock().expect("calls lock").push(url.to_string());

        let (outcome, gate) = {
            let routes = self.routes.lock().expect("routes lock");
            match routes.get(url) {
                Some(Route::Ready(outcome)) => (outcome.clone(), None),
                Some(Route::Gated(outcome, gate)) => (outcome.clone(), Some(gate.clone())),
                None => (
                    Err(FetchError::Status {
                        status: 404,
                        message: format!("No route for {}", url),
                    }),
                    None,
                ),
            }
        };

        if let Some(gate) = gate {
            gate.notified().await;
        }

        outcome
    }
}
