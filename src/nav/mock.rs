//! Mock fetcher for deterministic testing
//!
//! Implements `Fetcher` with scripted routes instead of a network. Every
//! request is captured so tests can assert on exactly what was sent.
//!
//! # Example
//! ```no_run
//! use regflow::nav::mock::{MockFetcher, MockResponse};
//! use regflow::nav::FetchMethod;
//!
//! let fetcher = MockFetcher::new("http://shop.test")
//!     .route(FetchMethod::Get, "/customer_register/?step=2", MockResponse::html("<div id=\"registrationWizard\"></div>"))
//!     .route(FetchMethod::Get, "/api/customers/check-duplicate/", MockResponse::json(r#"{"exists":false}"#));
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Url;

use crate::error::FetchError;
use crate::nav::fetch::{FetchMethod, FetchRequest, FetchResponse, Fetcher};

/// Scripted reply for one route
#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    /// Path (and query) the request "redirects" to; `None` keeps the request URL
    pub redirect_to: Option<String>,
    /// Delay before replying (simulates a slow server)
    pub delay: Duration,
    /// Fail at the transport level instead of replying
    pub fail: bool,
}

impl MockResponse {
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            redirect_to: None,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::html(body)
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::html("")
        }
    }

    pub fn transport_error() -> Self {
        Self {
            fail: true,
            ..Self::html("")
        }
    }

    pub fn redirected_to(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = Some(path.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Mock fetcher for testing
///
/// Routes are matched on method plus path-and-query; a route registered
/// without a query matches any query on that path. Later registrations win.
#[derive(Clone)]
pub struct MockFetcher {
    origin: Url,
    routes: Arc<Mutex<Vec<(FetchMethod, String, MockResponse)>>>,
    captured: Arc<Mutex<Vec<FetchRequest>>>,
}

impl MockFetcher {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: Url::parse(origin).expect("mock origin must be a valid URL"),
            routes: Arc::new(Mutex::new(Vec::new())),
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register (or override) a route
    pub fn route(self, method: FetchMethod, path: &str, response: MockResponse) -> Self {
        self.set_route(method, path, response);
        self
    }

    /// Register (or override) a route on a shared handle
    pub fn set_route(&self, method: FetchMethod, path: &str, response: MockResponse) {
        self.routes.lock().push((method, path.to_string(), response));
    }

    /// All requests received so far, in order
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.captured.lock().clone()
    }

    /// Requests with the given method
    pub fn requests_with(&self, method: FetchMethod) -> Vec<FetchRequest> {
        self.captured
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.captured.lock().len()
    }

    fn lookup(&self, method: FetchMethod, url: &Url) -> Option<MockResponse> {
        let path = url.path();
        let full = match url.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
        let routes = self.routes.lock();
        let candidates = || routes.iter().rev().filter(|(m, _, _)| *m == method);
        candidates()
            .find(|(_, route, _)| *route == full)
            .or_else(|| candidates().find(|(_, route, _)| !route.contains('?') && route == path))
            .map(|(_, _, response)| response.clone())
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn send(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.captured.lock().push(request.clone());

        let Some(response) = self.lookup(request.method, &request.url) else {
            return Err(FetchError::NoRoute {
                method: request.method.to_string(),
                url: request.url.to_string(),
            });
        };

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }

        if response.fail {
            return Err(FetchError::Transport {
                url: request.url.to_string(),
                message: "mock transport failure".to_string(),
            });
        }

        let url = match &response.redirect_to {
            Some(target) => self
                .origin
                .join(target)
                .map_err(|err| FetchError::Transport {
                    url: target.clone(),
                    message: err.to_string(),
                })?,
            None => request.url.clone(),
        };

        Ok(FetchResponse {
            status: response.status,
            url,
            body: response.body,
        })
    }
}
