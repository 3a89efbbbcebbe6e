//! Standard Bearer token authentication.

use reqwest_middleware::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};

/// Applies an access token to outgoing meeting API requests.
///
/// Uses the standard `Authorization: Bearer <token>` header and marks the header
/// value as sensitive so it is redacted from debug output.
pub struct BearerTokenAuth {
    token: SecretString,
}

impl BearerTokenAuth {
    /// Create a new Bearer token authenticator.
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    /// Apply authentication to a request builder.
    pub fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }
}
