//! Fetching, region swap decisions and history synchronization.

pub mod fetch;
pub mod history;
pub mod http;
pub mod mock;
mod swap;
mod token;

pub use fetch::{FetchMethod, FetchRequest, FetchResponse, Fetcher, AJAX_HEADER};
pub use history::{apply_history, Browser, HeadlessBrowser, HistoryMode, ScrollTarget};
pub use http::HttpFetcher;
pub use swap::{NavOutcome, SwapDecision};
pub use token::{OperationToken, OperationTokens};
