//! # HTTP Retrieval Utilities
//!
//! A small asynchronous JSON client around `reqwest`, with middleware for
//! exponential backoff on transient failures. Errors are reported as
//! [`FetchError`] so HTTP feeds slot straight into the poller loop.

use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::Url;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use std::time::Duration;

use crate::ingestors::FetchError;

/// Transient retries performed by the middleware inside a single fetch attempt.
const MAX_RETRIES: u32 = 3;

/// A flexible asynchronous HTTP client.
///
/// Built on top of `reqwest_middleware`, it handles base URLs, an optional
/// bearer token and automatic retries.
pub struct ApiClient {
    /// The underlying middleware-enabled client.
    inner: ClientWithMiddleware,
    /// The base URL to which all relative paths are joined.
    base_url: Url,
    /// An optional Bearer token used for authorization.
    auth_token: Option<String>,
}

impl ApiClient {
    /// Creates a client with a retry policy.
    ///
    /// # Errors
    /// Returns [`FetchError::Transport`] if `base_url` is not an absolute URL or
    /// the TLS backend cannot be initialised.
    pub fn new(base_url: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let url = Url::parse(base_url)
            .map_err(|e| FetchError::Transport(format!("invalid base url {:?}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("ticker/1.0")
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self { inner: client, base_url: url, auth_token })
    }

    /// The absolute base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// GETs `path` (relative to the base URL, may be empty) and decodes the body as JSON.
    ///
    /// # Errors
    /// - [`FetchError::Transport`] when the request could not be completed.
    /// - [`FetchError::Status`] for a non-2xx reply, carrying the body text.
    /// - [`FetchError::Malformed`] when the body is not JSON.
    pub async fn get_json(&self, path: &str, headers: Option<HeaderMap>) -> Result<serde_json::Value, FetchError> {
        // 1. Construct the full absolute URL
        let full_url = self
            .base_url
            .join(path)
            .map_err(|e| FetchError::Transport(format!("cannot join {:?}: {}", path, e)))?;
        let mut req = self.inner.get(full_url).header(ACCEPT, "application/json");

        // 2. Add custom headers and the bearer token
        if let Some(h) = headers {
            req = req.headers(h);
        }
        if let Some(token) = &self.auth_token {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        // 3. Execute and classify the response
        let response = req.send().await.map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status: status.as_u16(), body });
        }
        let text = response.text().await.map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_base_url_is_rejected() {
        let err = ApiClient::new("not a url", None, Duration::from_secs(1)).err();
        assert!(matches!(err, Some(FetchError::Transport(_))));
    }

    #[test]
    fn absolute_base_url_is_kept() {
        let client = ApiClient::new("http://127.0.0.1:9/feeds/", None, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url().join("market.json").unwrap().path(), "/feeds/market.json");
    }
}
