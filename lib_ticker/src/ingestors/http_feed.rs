//! # HTTP Feed
//!
//! GETs a JSON endpoint that already speaks the payload shape of its domain.

use futures_util::future::BoxFuture;
use std::time::Duration;

use super::poller::Poller;
use super::FetchError;
use crate::core::snapshot::Domain;
use crate::models::Payload;
use crate::retrieve::ApiClient;

/// A poller backed by an HTTP endpoint.
pub struct HttpFeed {
    domain: Domain,
    client: ApiClient,
}

impl HttpFeed {
    /// Polls `url` for `domain`. `timeout` bounds each HTTP request; the worker's
    /// fetch timeout still bounds the attempt as a whole.
    pub fn new(domain: Domain, url: &str, auth_token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self { domain, client: ApiClient::new(url, auth_token, timeout)? })
    }
}

impl Poller for HttpFeed {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn name(&self) -> String {
        format!("{}-http", self.domain)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Payload, FetchError>> {
        Box::pin(async move {
            let value = self.client.get_json("", None).await?;
            Payload::from_value(self.domain, value)
        })
    }
}
