use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_OPENMRS_URL: &str = "http://localhost:8080";
pub const DEFAULT_REST_BASE_URL: &str = "/openmrs/ws/rest/v1";
/// chrono rendering of the backend's `YYYY-MM-DDTHH:mm:ss.SSSZZ` date strings.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";
pub const DEFAULT_DEDUPE_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_CACHE_RETENTION_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_SERVER_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openmrs_url: String,
    pub rest_base_url: String,
    pub openmrs_username: Option<String>,
    pub openmrs_password: Option<String>,
    pub date_format: String,
    pub utc_offset_minutes: i32,
    pub dedupe_interval_ms: u64,
    /// How long an unused cached response is kept before it is dropped.
    pub cache_retention_ms: u64,
    pub server_port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openmrs_url: DEFAULT_OPENMRS_URL.to_string(),
            rest_base_url: DEFAULT_REST_BASE_URL.to_string(),
            openmrs_username: None,
            openmrs_password: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            utc_offset_minutes: 0,
            dedupe_interval_ms: DEFAULT_DEDUPE_INTERVAL_MS,
            cache_retention_ms: DEFAULT_CACHE_RETENTION_MS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            openmrs_url: env::var("OPENMRS_URL")
                .unwrap_or_else(|_| {
                    warn!("OPENMRS_URL not set, using default");
                    defaults.openmrs_url.clone()
                }),
            rest_base_url: env::var("OPENMRS_REST_BASE_URL")
                .unwrap_or_else(|_| {
                    warn!("OPENMRS_REST_BASE_URL not set, using default");
                    defaults.rest_base_url.clone()
                }),
            openmrs_username: env::var("OPENMRS_USERNAME").ok(),
            openmrs_password: env::var("OPENMRS_PASSWORD").ok(),
            date_format: env::var("OPENMRS_DATE_FORMAT")
                .unwrap_or_else(|_| defaults.date_format.clone()),
            utc_offset_minutes: parse_var("APPOINTMENTS_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes),
            dedupe_interval_ms: parse_var("QUERY_DEDUPE_INTERVAL_MS", defaults.dedupe_interval_ms),
            cache_retention_ms: parse_var("QUERY_CACHE_RETENTION_MS", defaults.cache_retention_ms),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
        };

        if !config.is_configured() {
            warn!("OpenMRS credentials not set - requests will be sent anonymously");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.openmrs_url.is_empty()
            && self.openmrs_username.as_deref().is_some_and(|u| !u.is_empty())
            && self.openmrs_password.is_some()
    }

    /// Absolute URL for a path under the REST base, e.g. `/appointment/all`.
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}{}", self.rest_base_url.trim_end_matches('/'), path)
    }
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_openmrs() {
        let config = AppConfig::default();
        assert_eq!(config.openmrs_url, "http://localhost:8080");
        assert_eq!(config.dedupe_interval_ms, 2000);
        assert_eq!(config.cache_retention_ms, 300_000);
        assert!(!config.is_configured());
    }

    #[test]
    fn test_rest_url_joins_base_and_path() {
        let config = AppConfig {
            rest_base_url: "/openmrs/ws/rest/v1/".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(
            config.rest_url("/appointment/all"),
            "/openmrs/ws/rest/v1/appointment/all"
        );
    }

    #[test]
    fn test_credentials_make_config_complete() {
        let config = AppConfig {
            openmrs_username: Some("admin".to_string()),
            openmrs_password: Some("Admin123".to_string()),
            ..AppConfig::default()
        };
        assert!(config.is_configured());
    }
}
