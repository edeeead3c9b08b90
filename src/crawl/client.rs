//! HTTP client for the external page-fetch engine.
//!
//! The engine runs as a separate service (a headless-browser crawler) and
//! exposes a single extraction endpoint: POST the target URL and extraction
//! options, receive the markdown extract plus raw image descriptors.

use super::{FetchOptions, PageExtract, PageFetcher};
use crate::error::{FortellError, Result};
use crate::retry::{self, RetryPolicy};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Client for the fetch-engine extraction endpoint.
pub struct FetchEngineClient {
    http: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    url: &'a str,
    #[serde(flatten)]
    options: &'a FetchOptions,
}

impl FetchEngineClient {
    /// Create a client for the given extraction endpoint.
    pub fn new(endpoint: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FortellError::Fetch(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            retry,
        })
    }
}

#[async_trait]
impl PageFetcher for FetchEngineClient {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<PageExtract> {
        debug!("Requesting extraction of {}", url);

        let request = ExtractRequest { url, options };

        let extract = retry::with_backoff(&self.retry, "page fetch", || async {
            let response = self
                .http
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await?
                .error_for_status()?;

            response.json::<PageExtract>().await
        })
        .await
        .map_err(|e| FortellError::Fetch(format!("{}: {}", url, e)))?;

        Ok(extract)
    }
}
