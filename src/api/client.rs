//! HTTP client for the playlist backend with path-only request logging.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::info;
use url::Url;

use crate::config::ApiConfig;
use crate::error::AppError;

/// User agent string for all backend requests.
const CLIENT_USER_AGENT: &str = concat!("song-names/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over `reqwest::Client` bound to one backend base URL.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Builds a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` if the URL or timeout is unusable.
    pub fn new(config: &ApiConfig) -> Result<Self, AppError> {
        config.validate()?;

        // A trailing slash makes `join` append to any base path instead of
        // replacing its last segment.
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| {
            AppError::InvalidConfig(format!("invalid API URL '{}': {}", config.base_url, e))
        })?;

        Ok(Self {
            http: build_http_client(config.timeout_secs)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins `path` onto the base URL.
    pub fn build_url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|_| AppError::InvalidConfig(format!("Invalid path: {}", path)))
    }

    /// GETs `path` and decodes a JSON body.
    ///
    /// # Errors
    ///
    /// - `AppError::ConnectionFailed` - Transport failure or timeout
    /// - `AppError::HttpStatus` - Non-2xx response
    /// - `AppError::InvalidResponse` - Body is not the expected JSON
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.build_url(path)?;
        let response = self.execute_get(url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Failed to read body: {}", e)))?;

        serde_json::from_slice(&body).map_err(|e| AppError::InvalidResponse(e.to_string()))
    }

    /// Sends a GET and logs method, path, status and latency.
    ///
    /// Only the URL path is logged; query strings never reach the log.
    async fn execute_get(&self, url: Url) -> Result<reqwest::Response, AppError> {
        let start = Instant::now();
        let result = self.http.get(url.as_str()).send().await;
        let duration_ms = start.elapsed().as_millis();

        match result {
            Ok(response) => {
                info!(
                    "[API] GET {} {} {}ms",
                    url.path(),
                    response.status().as_u16(),
                    duration_ms
                );
                Ok(response)
            }
            Err(e) => {
                info!("[API] GET {} FAILED {}ms", url.path(), duration_ms);
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("could not connect to {}", self.base_url)
                } else {
                    "request failed".to_string()
                };
                Err(AppError::ConnectionFailed(reason))
            }
        }
    }
}

/// Builds the configured HTTP client.
fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, AppError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AppError::InvalidConfig(format!("Failed to build HTTP client: {}", e)))
}
