//! # File Feed
//!
//! Reads a JSON or JSON5 document from disk on every poll. Useful on a bench,
//! behind an external fetcher that drops files, and in tests.

use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};

use super::poller::Poller;
use super::FetchError;
use crate::core::snapshot::Domain;
use crate::models::Payload;

/// A poller backed by a file.
#[derive(Debug, Clone)]
pub struct FileFeed {
    domain: Domain,
    path: PathBuf,
}

impl FileFeed {
    /// Reads `path` as the payload of `domain`.
    pub fn new(domain: Domain, path: impl AsRef<Path>) -> Self {
        Self { domain, path: path.as_ref().to_path_buf() }
    }
}

impl Poller for FileFeed {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn name(&self) -> String {
        format!("{}-file", self.domain)
    }

    fn fetch(&self) -> BoxFuture<'_, Result<Payload, FetchError>> {
        Box::pin(async move {
            let text = tokio::fs::read_to_string(&self.path).await?;
            Payload::parse(self.domain, &text)
        })
    }
}
