use async_trait::async_trait;
use reqwest::Url;

use crate::error::FetchError;

/// Header identifying asynchronous requests to the server
pub const AJAX_HEADER: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// HTTP method used by the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchMethod {
    Get,
    Post,
}

impl FetchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMethod::Get => "GET",
            FetchMethod::Post => "POST",
        }
    }
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against the wizard server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: FetchMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// URL-encoded body fields (POST only)
    pub form: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: FetchMethod::Get,
            url,
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    pub fn post(url: Url, form: Vec<(String, String)>) -> Self {
        Self {
            method: FetchMethod::Post,
            url,
            headers: Vec::new(),
            form,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Mark the request as an in-page (AJAX) request
    pub fn ajax(self) -> Self {
        self.with_header(AJAX_HEADER.0, AJAX_HEADER.1)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a body field
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response after redirects were followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    /// Final URL after redirects; governs swap vs. hard navigation
    pub url: Url,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs network requests for the synchronizer
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Send one request, following redirects and reporting the resolved URL.
    ///
    /// Non-2xx statuses are returned as responses, not errors.
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}
