use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate};

use shared_config::AppConfig;
use shared_openmrs::{Fetcher, OpenmrsClient, QueryClient};

use crate::models::{AppointmentMetricsError, SelectedDate};

/// Shared state for the metrics routes. One query cache serves every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub query_client: Arc<QueryClient>,
}

impl AppState {
    pub fn new(config: AppConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let query_client = Arc::new(QueryClient::from_config(fetcher, &config));
        Self {
            config: Arc::new(config),
            query_client,
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let fetcher = Arc::new(OpenmrsClient::new(&config));
        Self::new(config, fetcher)
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, AppointmentMetricsError> {
        let minutes = self.config.utc_offset_minutes;
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(AppointmentMetricsError::InvalidUtcOffset(minutes))
    }

    /// Parse a `YYYY-MM-DD` query value; no value means today.
    pub fn selected_date(&self, raw: Option<&str>) -> Result<SelectedDate, AppointmentMetricsError> {
        let offset = self.utc_offset()?;
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => {
                let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
                    .map_err(|_| AppointmentMetricsError::InvalidDate(value.to_string()))?;
                SelectedDate::new(date, offset)
            }
            None => SelectedDate::today(offset),
        }
    }
}
