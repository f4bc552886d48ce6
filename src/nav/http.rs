//! `reqwest`-backed fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error::FetchError;
use crate::nav::fetch::{FetchMethod, FetchRequest, FetchResponse, Fetcher};

const MAX_REDIRECTS: usize = 10;

/// Fetcher for a live server.
///
/// Keeps a cookie jar so session and CSRF cookies travel with every request,
/// the way same-origin credentials do in a browser.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        let requested = request.url.to_string();
        let mut builder = match request.method {
            FetchMethod::Get => self.client.get(request.url),
            FetchMethod::Post => self.client.post(request.url).form(&request.form),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|err| FetchError::Transport {
            url: requested.clone(),
            message: err.to_string(),
        })?;

        let status = response.status().as_u16();
        let url = response.url().clone();
        tracing::debug!(
            method = %request.method,
            requested = %requested,
            resolved = %url,
            status,
            "Fetch completed"
        );

        let body = response.text().await.map_err(|err| FetchError::Body {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        Ok(FetchResponse { status, url, body })
    }
}
