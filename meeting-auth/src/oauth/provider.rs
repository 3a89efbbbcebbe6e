//! Token provider trait and types.

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::Error;

/// An access token as reported by the authorization server.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Bearer token for API requests.
    pub access_token: SecretString,
    /// Lifetime in seconds, as reported by the server.
    pub expires_in: u64,
}

/// Source of fresh access tokens.
///
/// A provider performs exactly one exchange per call and holds no state about
/// previously issued tokens; caching is the job of [`super::token::TokenCache`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// Perform a credential exchange against the remote authorization endpoint.
    ///
    /// # Errors
    ///
    /// * `Configuration` when a credential needed for the exchange is missing.
    /// * `Authentication` when the exchange is unreachable, times out, is rejected
    ///   or answers with something other than a token.
    async fn request_token(&self) -> Result<IssuedToken, Error>;
}
