use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, ACCEPT},
    Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;
use shared_models::error::FetchError;

use crate::fetcher::{FetchResponse, Fetcher};

pub struct OpenmrsClient {
    client: Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl OpenmrsClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.openmrs_url.trim_end_matches('/').to_string(),
            username: config.openmrs_username.clone(),
            password: config.openmrs_password.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    pub async fn request(&self, method: Method, path: &str) -> Result<FetchResponse, FetchError> {
        let url = self.resolve_url(path);
        debug!("Making request to {}", url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers());

        if let Some(username) = &self.username {
            req = req.basic_auth(username, self.password.as_deref());
        }

        let response = req.send().await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.bytes().await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = error_message(&body);
            error!("OpenMRS API error ({}): {}", status, message);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let data = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)?
        };

        Ok(FetchResponse::new(status.as_u16(), data))
    }

    pub async fn get<T>(&self, path: &str) -> Result<T, FetchError>
    where T: DeserializeOwned {
        self.request(Method::GET, path).await?.decode()
    }
}

#[async_trait]
impl Fetcher for OpenmrsClient {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.request(Method::GET, url).await
    }
}

/// OpenMRS wraps failures as `{ "error": { "message": ... } }`; fall back to the raw body.
fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}
