// libs/appointment-metrics-cell/src/models.rs
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use shared_models::error::{AppError, FetchError};

pub const ALL_APPOINTMENTS_COUNT: &str = "allAppointmentsCount";
pub const MISSED_APPOINTMENTS_COUNT: &str = "missedAppointmentsCount";

const LAST_MILLISECOND_OF_DAY: i64 = 24 * 60 * 60 * 1000 - 1;

// ==============================================================================
// SELECTED DATE
// ==============================================================================

/// The day every hook reports on, as its first and last millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectedDate {
    start_of_day: DateTime<FixedOffset>,
    end_of_day: DateTime<FixedOffset>,
}

impl SelectedDate {
    /// Fails when either bound of the day falls outside chrono's range.
    pub fn new(date: NaiveDate, offset: FixedOffset) -> Result<Self, AppointmentMetricsError> {
        let out_of_range = || AppointmentMetricsError::InvalidDate(date.to_string());

        let utc = date
            .and_time(NaiveTime::MIN)
            .checked_sub_signed(Duration::seconds(offset.local_minus_utc() as i64))
            .ok_or_else(out_of_range)?;
        let start_of_day = DateTime::from_naive_utc_and_offset(utc, offset);
        let end_of_day = start_of_day
            .checked_add_signed(Duration::milliseconds(LAST_MILLISECOND_OF_DAY))
            .ok_or_else(out_of_range)?;

        Ok(Self { start_of_day, end_of_day })
    }

    pub fn today(offset: FixedOffset) -> Result<Self, AppointmentMetricsError> {
        Self::new(Utc::now().with_timezone(&offset).date_naive(), offset)
    }

    pub fn date(&self) -> NaiveDate {
        self.start_of_day.date_naive()
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start_of_day
    }

    /// 23:59:59.999 on the same day.
    pub fn end_of_day(&self) -> DateTime<FixedOffset> {
        self.end_of_day
    }

    pub fn format(&self, pattern: &str) -> String {
        format_date_time(self.start(), pattern)
    }

    pub fn format_end_of_day(&self, pattern: &str) -> String {
        format_date_time(self.end_of_day(), pattern)
    }
}

impl fmt::Display for SelectedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start_of_day.to_rfc3339_opts(SecondsFormat::Millis, false))
    }
}

fn format_date_time(value: DateTime<FixedOffset>, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", value.format(pattern)).is_err() {
        warn!("Invalid date format '{}', falling back to RFC 3339", pattern);
        return value.to_rfc3339_opts(SecondsFormat::Millis, false);
    }
    out
}

// ==============================================================================
// OPENMRS RESOURCES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRef {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
}

/// Per-service appointment counts for one day, keyed by status category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AppointmentSummaryWire")]
pub struct AppointmentSummary {
    pub service_uuid: String,
    pub service_name: String,
    pub counts: BTreeMap<String, u64>,
}

impl AppointmentSummary {
    pub fn count(&self, status_key: &str) -> u64 {
        self.counts.get(status_key).copied().unwrap_or(0)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentSummaryWire {
    appointment_service: ServiceRef,
    #[serde(default)]
    appointment_count_map: BTreeMap<String, BTreeMap<String, Value>>,
}

impl TryFrom<AppointmentSummaryWire> for AppointmentSummary {
    type Error = String;

    fn try_from(wire: AppointmentSummaryWire) -> Result<Self, Self::Error> {
        let mut counts = BTreeMap::new();

        // The backend reports one entry per day; only the `*Count` fields are counts.
        for daily in wire.appointment_count_map.values() {
            for (key, value) in daily.iter().filter(|(key, _)| key.ends_with("Count")) {
                let count = value.as_u64().ok_or_else(|| {
                    format!("{} for service {} is not a non-negative integer", key, wire.appointment_service.uuid)
                })?;
                *counts.entry(key.clone()).or_insert(0) += count;
            }
        }

        Ok(Self {
            service_uuid: wire.appointment_service.uuid,
            service_name: wire.appointment_service.name,
            counts,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderResponse {
    Accepted,
    Awaiting,
    Rejected,
    Tentative,
    Cancelled,
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for ProviderResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderResponse::Accepted => write!(f, "ACCEPTED"),
            ProviderResponse::Awaiting => write!(f, "AWAITING"),
            ProviderResponse::Rejected => write!(f, "REJECTED"),
            ProviderResponse::Tentative => write!(f, "TENTATIVE"),
            ProviderResponse::Cancelled => write!(f, "CANCELLED"),
            ProviderResponse::Other => write!(f, "OTHER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAssignment {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub response: ProviderResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub uuid: String,
    #[serde(default)]
    pub service: Option<ServiceRef>,
    #[serde(default)]
    pub providers: Option<Vec<ProviderAssignment>>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub appointment_kind: Option<String>,
}

impl Appointment {
    pub fn providers(&self) -> &[ProviderAssignment] {
        self.providers.as_deref().unwrap_or(&[])
    }

    pub fn service_uuid(&self) -> Option<&str> {
        self.service.as_ref().map(|s| s.uuid.as_str())
    }
}

/// An appointment service as listed in the header filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub uuid: String,
    pub name: String,
}

impl ServiceType {
    /// The synthetic "All" entry; its empty identifier means "no filter".
    pub fn all() -> Self {
        Self {
            uuid: String::new(),
            name: "All".to_string(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.uuid.is_empty()
    }
}

// ==============================================================================
// DERIVED RECORDS & HOOK VIEW-MODELS
// ==============================================================================

/// One (service, status category) pair from a flattened summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatusCount {
    pub service_uuid: String,
    pub service_name: String,
    pub status: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClinicalMetrics {
    pub is_loading: bool,
    pub error: Option<FetchError>,
    pub total_appointments: u64,
    pub missed_appointments: u64,
    pub highest_service_load: Option<ServiceStatusCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderMetrics {
    pub total_providers: usize,
    pub is_loading: bool,
    pub error: Option<FetchError>,
    pub is_validating: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduledAppointments {
    pub is_loading: bool,
    pub error: Option<FetchError>,
    pub total_scheduled_appointments: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceTypes {
    pub service_types: Vec<ServiceType>,
    pub is_loading: bool,
    pub error: Option<FetchError>,
}

// ==============================================================================
// HEADER VIEW
// ==============================================================================

pub type ServiceChangeHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Whether the header offers the service-type selector, and who hears about
/// a selection when it does.
#[derive(Clone, Default)]
pub enum ServiceFilter {
    #[default]
    Disabled,
    Enabled(ServiceChangeHandler),
}

impl ServiceFilter {
    pub fn enabled<F>(on_change: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        ServiceFilter::Enabled(Arc::new(on_change))
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ServiceFilter::Enabled(_))
    }
}

impl fmt::Debug for ServiceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceFilter::Disabled => write!(f, "Disabled"),
            ServiceFilter::Enabled(_) => write!(f, "Enabled(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeaderProps {
    pub title: String,
    pub appointment_service_type: Option<String>,
    pub filter: ServiceFilter,
}

impl HeaderProps {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_service_type(mut self, service_uuid: impl Into<String>) -> Self {
        self.appointment_service_type = Some(service_uuid.into());
        self
    }

    pub fn with_filter(mut self, filter: ServiceFilter) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSelectorView {
    pub id: &'static str,
    pub aria_label: &'static str,
    pub label: &'static str,
    pub title_text: &'static str,
    pub items: Vec<ServiceType>,
    pub selected: ServiceType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderView {
    pub test_id: &'static str,
    pub title: String,
    pub pictogram: &'static str,
    pub selector: Option<ServiceSelectorView>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum AppointmentMetricsError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidUtcOffset(i32),
}

impl From<AppointmentMetricsError> for AppError {
    fn from(err: AppointmentMetricsError) -> Self {
        match err {
            AppointmentMetricsError::InvalidDate(_) => AppError::BadRequest(err.to_string()),
            AppointmentMetricsError::InvalidUtcOffset(_) => AppError::Internal(err.to_string()),
        }
    }
}
