// src/services/fetcher.rs

//! Content fetchers.
//!
//! Retrieves raw page content for one URL, or raw bytes for many URLs at
//! once (listing images).

use async_trait::async_trait;
use futures::stream::{BoxStream, FuturesUnordered, StreamExt};
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;
use crate::utils::http::create_async_client;
use crate::utils::url::check_host_in;

/// Outcome of one request issued by [`PropertyFetcher::fetch_many`].
#[derive(Debug)]
pub struct FetchedItem {
    pub url: String,
    pub result: Result<Vec<u8>>,
}

/// Trait for raw content retrieval.
#[async_trait]
pub trait PropertyFetcher: Send + Sync {
    /// Whether this fetcher handles the URL's host.
    fn supports(&self, url: &str) -> Result<bool>;

    /// Fetch one page as text. Non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Issue one request per URL at once and yield each result as it
    /// completes. Failures are reported per item and never cancel siblings;
    /// dropping the stream leaves in-flight requests to finish on their own.
    fn fetch_many(&self, urls: Vec<String>) -> BoxStream<'static, FetchedItem>;
}

/// Fetcher over a shared pooled HTTP client, routed by host.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    hosts: Vec<String>,
}

impl HttpFetcher {
    /// Create a fetcher accepting `hosts`, sending the configured headers.
    pub fn new(config: &FetcherConfig, hosts: Vec<String>) -> Result<Self> {
        Ok(Self::with_client(create_async_client(config)?, hosts))
    }

    pub fn with_client(client: Client, hosts: Vec<String>) -> Self {
        Self { client, hosts }
    }

    async fn get(client: &Client, url: &str) -> Result<reqwest::Response> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP {status}")));
        }
        Ok(response)
    }

    async fn download(client: Client, url: String) -> Result<Vec<u8>> {
        let response = Self::get(&client, &url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::fetch(&url, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PropertyFetcher for HttpFetcher {
    fn supports(&self, url: &str) -> Result<bool> {
        check_host_in(url, &self.hosts)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        log::info!("Fetching {}", url);
        let response = Self::get(&self.client, url).await?;
        response.text().await.map_err(|e| AppError::fetch(url, e))
    }

    fn fetch_many(&self, urls: Vec<String>) -> BoxStream<'static, FetchedItem> {
        log::debug!("Fetching {} urls concurrently", urls.len());

        // Every request is spawned here, before the stream is polled.
        let pending: FuturesUnordered<_> = urls
            .into_iter()
            .map(|url| {
                let handle = tokio::spawn(Self::download(self.client.clone(), url.clone()));
                async move {
                    let result = match handle.await {
                        Ok(result) => result,
                        Err(e) => Err(AppError::fetch(&url, format!("request task failed: {e}"))),
                    };
                    FetchedItem { url, result }
                }
            })
            .collect();

        pending.boxed()
    }
}
