// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

/// Create a configured asynchronous HTTP client.
///
/// The configured headers are attached to every request the client sends.
pub fn create_async_client(config: &FetcherConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(default_headers(config)?)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| AppError::config(format!("Failed to build HTTP client: {e}")))
}

fn default_headers(config: &FetcherConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AppError::config(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("Invalid value for header '{name}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
