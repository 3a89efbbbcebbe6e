//! HTTP client building with middleware.

mod client;
mod retry;

pub use client::{HttpClient, HttpClientBuilder, HttpClientConfig};
pub use retry::BackoffPolicy;

pub use reqwest_middleware::RequestBuilder;
