//! # Data Retrieval Module
//!
//! Generic HTTP retrieval used by the network feeds. Request building, error
//! classification and transient retries live here so a feed only has to say
//! which URL maps to which domain.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: an `ApiClient` built on `reqwest` and `reqwest-middleware`,
//!   retrying transient failures with exponential backoff.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Generic HTTP API client with retry middleware.
pub mod ky_http;

pub use ky_http::ApiClient;
