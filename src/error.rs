//! Error types for the registration flow synchronizer.

use std::io;

/// Transport-level failure of a single fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body could not be read.
    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    /// The HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// No scripted route matched (mock fetcher only).
    #[error("No route for {method} {url}")]
    NoRoute { method: String, url: String },
}

/// A browser history write was refused.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The new entry is not same-origin with the current document.
    #[error("Cross-origin history entry rejected: {0}")]
    CrossOrigin(String),

    /// The host refused the write (quota, sandboxing, detached document).
    #[error("History write rejected: {0}")]
    Rejected(String),
}

/// Durable snapshot storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Top-level error for controller operations.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    /// Fetch failed before any markup was received.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// No document is attached yet.
    #[error("No document attached")]
    NoDocument,

    /// The attached region carries no form.
    #[error("No form in region '{0}'")]
    NoForm(String),

    /// An input event named a field the live form does not have.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A URL could not be parsed or joined.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Configuration could not be applied.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl WizardError {
    pub fn invalid_url(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        WizardError::InvalidUrl {
            url: url.into(),
            message: err.to_string(),
        }
    }
}
