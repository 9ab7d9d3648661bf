use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use shared_models::error::FetchError;

/// A decoded response from the REST API. `data` holds the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub status: u16,
    pub data: Value,
}

impl FetchResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    pub fn ok(data: Value) -> Self {
        Self::new(200, data)
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}

/// The one network capability the hooks need.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}
