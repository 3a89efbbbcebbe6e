//! Access token caching with single-flight acquisition.

mod cache;
mod credential;

pub use cache::TokenCache;
pub use credential::{CachedCredential, EXPIRY_MARGIN_SECS};
