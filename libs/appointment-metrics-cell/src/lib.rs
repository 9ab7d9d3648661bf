// =====================================================================================
// APPOINTMENT METRICS CELL - DAILY APPOINTMENT DASHBOARD
// =====================================================================================
//
// Hooks over the OpenMRS appointments API for one selected day:
// - Clinical metrics (total, missed, highest service load)
// - Unique accepted providers
// - Scheduled appointment count, optionally per service
// - The page header view with its service-type filter
//
// =====================================================================================

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use models::{
    Appointment, AppointmentSummary, ClinicalMetrics, HeaderProps, HeaderView,
    ProviderMetrics, ScheduledAppointments, SelectedDate, ServiceFilter, ServiceType,
    ServiceTypes, AppointmentMetricsError,
};

pub use services::{
    AppointmentsHeader, AppointmentsHeaderService, ClinicalMetricsService,
    ProviderMetricsService, ScheduledAppointmentsService, ServiceTypesService,
};

pub use router::appointment_metrics_routes;
pub use state::AppState;
