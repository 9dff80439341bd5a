//! Content fetch collaborator for workflow steps.

use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::{AppError, Result};

/// Fetches the text content of a URL. Opaque to the engine: the only
/// contract is "succeeds or raises".
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its body as text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Fetch`](crate::AppError::Fetch) on any
    /// transport or status failure.
    fn fetch(&self, url: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

/// Plain HTTP fetcher used by the brand-analysis scrape step.
pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    /// Build the fetcher.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Fetch` if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| AppError::Fetch(format!("failed to build http client: {err}")))?;
        Ok(Self { http })
    }
}

impl ContentFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        let url = url.to_owned();
        Box::pin(async move {
            debug!(%url, "fetching content");
            let response = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|err| AppError::Fetch(format!("request to {url} failed: {err}")))?
                .error_for_status()
                .map_err(|err| AppError::Fetch(format!("{url} returned failure: {err}")))?;
            response
                .text()
                .await
                .map_err(|err| AppError::Fetch(format!("failed to read body of {url}: {err}")))
        })
    }
}
