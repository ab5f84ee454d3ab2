//! Error type for BookStack API calls.

use thiserror::Error;

/// Failure talking to the BookStack REST API. None of these are retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid URL: {input}: {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Network error: could not reach {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Authentication failed (HTTP {status}) at {url}. Check --token and --secret, and that the user has API access.")]
    Unauthorized { status: u16, url: String },

    #[error("HTTP {status} when fetching: {url}{}", message.as_deref().map(|m| format!(" ({})", m)).unwrap_or_default())]
    HttpStatus {
        status: u16,
        url: String,
        /// Response body excerpt, when BookStack returned one.
        message: Option<String>,
    },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: reqwest::Error },

    #[error("Unexpected response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
