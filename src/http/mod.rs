//! HTTP client module
//!
//! Thin adapter over `reqwest` that joins request paths onto the API base
//! URL, attaches the access token header and captures each response as an
//! [`ApiResponse`].
//!
//! There is no retry, backoff or rate limiting beyond what `reqwest` does by
//! default.

mod client;

pub use client::{ApiResponse, HttpClient, HttpClientConfig, HttpClientConfigBuilder};
