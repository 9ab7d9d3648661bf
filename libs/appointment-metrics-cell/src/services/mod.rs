pub mod aggregation;
pub mod clinical_metrics;
pub mod header;
pub mod providers;
pub mod scheduled;
pub mod service_types;

pub use clinical_metrics::ClinicalMetricsService;
pub use header::{AppointmentsHeader, AppointmentsHeaderService};
pub use providers::ProviderMetricsService;
pub use scheduled::ScheduledAppointmentsService;
pub use service_types::ServiceTypesService;

use shared_config::AppConfig;

use crate::models::SelectedDate;

/// `GET /appointment/all?forDate=` for `date`, shared by the providers and
/// scheduled-count hooks so both read the same cache entry.
pub(crate) fn all_appointments_url(config: &AppConfig, date: &SelectedDate) -> String {
    format!(
        "{}?forDate={}",
        config.rest_url("/appointment/all"),
        urlencoding::encode(&date.format(&config.date_format))
    )
}
