//! HTTP client for the PocketLedger cloud collections API.
//!
//! Implements the core crate's [`RemoteStore`] seam over the REST endpoints.
//! Records travel as plain JSON objects; the backend mints authoritative ids
//! on insert.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

use pocketledger_core::errors::RemoteError;
use pocketledger_core::remote::{RemoteFilter, RemoteStore};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BASE_URL: &str = "https://api.pocketledger.app";
const MAX_LOG_BODY_CHARS: usize = 512;

/// Error body returned by the collections API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorResponse {
    fn into_message(self) -> String {
        match self.message {
            Some(message) if !message.is_empty() => message,
            _ => self.error,
        }
    }
}

/// Client for the PocketLedger cloud collections API.
#[derive(Debug, Clone)]
pub struct ConnectClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ConnectClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the cloud API (e.g., "https://api.pocketledger.app")
    /// * `token` - Bearer token identifying the ledger owner
    pub fn new(base_url: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Create a client from `POCKETLEDGER_API_URL` (optional, defaults to the
    /// hosted endpoint) and `POCKETLEDGER_API_TOKEN` (required).
    pub fn from_env() -> Result<Self, RemoteError> {
        let base_url =
            std::env::var("POCKETLEDGER_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = std::env::var("POCKETLEDGER_API_TOKEN")
            .map_err(|_| RemoteError::auth("POCKETLEDGER_API_TOKEN is not set"))?;
        Ok(Self::new(&base_url, &token))
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, collection)
    }

    fn record_url(&self, collection: &str, id: &str) -> String {
        format!("{}/api/v1/{}/{}", self.base_url, collection, id)
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap, RemoteError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let auth_value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| RemoteError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[Connect] API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[Connect] API response error ({}): {}", status, preview);
    }

    fn map_error_body(status: u16, body: &str) -> RemoteError {
        let message = match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(parsed) => parsed.into_message(),
            Err(_) => body.to_string(),
        };
        match status {
            401 | 403 => RemoteError::auth(message),
            _ => RemoteError::rejected(status, message),
        }
    }

    fn transport_error(err: reqwest::Error) -> RemoteError {
        RemoteError::unavailable(err.to_string())
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();
        let body = response.text().await.map_err(Self::transport_error)?;
        Self::log_response(status, &body);

        if !status.is_success() {
            return Err(Self::map_error_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|err| RemoteError::malformed(format!("Failed to parse response: {err}")))
    }

    /// Check status only; succeeds on any 2xx regardless of body.
    async fn expect_success(response: reqwest::Response) -> Result<(), RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.map_err(Self::transport_error)?;
        Self::log_response(status, &body);
        Err(Self::map_error_body(status.as_u16(), &body))
    }
}

#[async_trait]
impl RemoteStore for ConnectClient {
    /// Insert a record; the backend mints and returns the authoritative id.
    ///
    /// POST /api/v1/{collection}
    async fn insert(&self, collection: &str, record: Value) -> Result<Value, RemoteError> {
        let url = self.collection_url(collection);
        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(&record)
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::parse_response(response).await
    }

    /// Apply a partial update; returns the full updated record.
    ///
    /// PATCH /api/v1/{collection}/{id}
    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<Value, RemoteError> {
        let url = self.record_url(collection, id);
        let response = self
            .client
            .patch(&url)
            .headers(self.headers()?)
            .json(&patch)
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::parse_response(response).await
    }

    /// Delete a record.
    ///
    /// DELETE /api/v1/{collection}/{id}
    async fn delete(&self, collection: &str, id: &str) -> Result<(), RemoteError> {
        let url = self.record_url(collection, id);
        let response = self
            .client
            .delete(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(Self::transport_error)?;
        Self::expect_success(response).await
    }

    /// Fetch records, optionally narrowed by field-equality constraints
    /// rendered as query parameters.
    ///
    /// GET /api/v1/{collection}?field=value
    async fn query(
        &self,
        collection: &str,
        filter: &RemoteFilter,
    ) -> Result<Vec<Value>, RemoteError> {
        let url = self.collection_url(collection);
        let mut request = self.client.get(&url).headers(self.headers()?);
        if !filter.is_empty() {
            let query: Vec<(String, String)> = filter
                .constraints()
                .iter()
                .map(|(field, value)| (field.clone(), query_value(value)))
                .collect();
            request = request.query(&query);
        }

        let response = request.send().await.map_err(Self::transport_error)?;
        Self::parse_response(response).await
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
