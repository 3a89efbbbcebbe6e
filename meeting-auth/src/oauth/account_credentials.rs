//! Zoom Server-to-Server OAuth using the `account_credentials` grant.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{IssuedToken, Provider};
use crate::error::{
    authentication_error, configuration_error, AuthenticationErrorKind, ConfigurationErrorKind,
    Error, ErrorKind,
};
use crate::http::HttpClient;

const GRANT_TYPE: &str = "account_credentials";

/// Credentials of a Server-to-Server OAuth app.
///
/// Each value may be absent; absence (or an empty value) is reported as a
/// configuration error the first time a token is requested.
#[derive(Debug, Clone, Default)]
pub struct AccountCredentials {
    pub account_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
}

impl AccountCredentials {
    pub fn new(
        account_id: Option<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            account_id,
            client_id,
            client_secret: client_secret.map(SecretString::new),
        }
    }

    fn require(&self) -> Result<(&str, &str, &str), Error> {
        let account_id = non_empty(self.account_id.as_deref()).ok_or_else(|| {
            configuration_error(
                ConfigurationErrorKind::MissingAccountId,
                "Zoom account ID is not configured",
            )
        })?;
        let client_id = non_empty(self.client_id.as_deref()).ok_or_else(|| {
            configuration_error(
                ConfigurationErrorKind::MissingClientId,
                "Zoom client ID is not configured",
            )
        })?;
        let client_secret = non_empty(self.client_secret.as_ref().map(|s| s.expose_secret().as_str()))
            .ok_or_else(|| {
                configuration_error(
                    ConfigurationErrorKind::MissingClientSecret,
                    "Zoom client secret is not configured",
                )
            })?;
        Ok((account_id, client_id, client_secret))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Exchanges account credentials for an access token.
pub struct AccountCredentialsProvider {
    credentials: AccountCredentials,
    token_url: Url,
    http_client: HttpClient,
}

impl AccountCredentialsProvider {
    /// Create a provider posting to `token_url`.
    pub fn new(
        credentials: AccountCredentials,
        token_url: &str,
        http_client: HttpClient,
    ) -> Result<Self, Error> {
        let token_url = Url::parse(token_url).map_err(|e| {
            configuration_error(
                ConfigurationErrorKind::InvalidUrl,
                &format!("Invalid OAuth token URL {token_url}: {e}"),
            )
        })?;

        Ok(Self {
            credentials,
            token_url,
            http_client,
        })
    }

    /// The token endpoint with grant type and account ID appended as query parameters.
    fn exchange_url(&self, account_id: &str) -> Url {
        let mut url = self.token_url.clone();
        url.query_pairs_mut()
            .append_pair("grant_type", GRANT_TYPE)
            .append_pair("account_id", account_id);
        url
    }
}

#[async_trait]
impl Provider for AccountCredentialsProvider {
    async fn request_token(&self) -> Result<IssuedToken, Error> {
        let (account_id, client_id, client_secret) = self.credentials.require()?;

        debug!("Requesting Zoom access token for account {}", account_id);

        let response = self
            .http_client
            .post(self.exchange_url(account_id))
            .basic_auth(client_id, Some(client_secret))
            .send()
            .await
            .map_err(exchange_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Zoom OAuth token exchange rejected with {}: {}", status, body);
            return Err(authentication_error(
                AuthenticationErrorKind::Rejected,
                &format!("Token endpoint responded with {status}"),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Zoom OAuth token response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Authentication(AuthenticationErrorKind::InvalidResponse),
            }
        })?;

        if token.access_token.is_empty() {
            return Err(authentication_error(
                AuthenticationErrorKind::InvalidResponse,
                "Token endpoint returned an empty access token",
            ));
        }

        Ok(IssuedToken {
            access_token: SecretString::new(token.access_token),
            expires_in: token.expires_in,
        })
    }
}

fn exchange_send_error(err: reqwest_middleware::Error) -> Error {
    let kind = match &err {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => AuthenticationErrorKind::Timeout,
        _ => AuthenticationErrorKind::Network,
    };
    warn!("Zoom OAuth token exchange failed: {}", err);
    Error {
        source: Some(Box::new(err)),
        error_kind: ErrorKind::Authentication(kind),
    }
}

/// A token URL whose server accepts connections and never answers.
#[cfg(test)]
pub(crate) async fn unresponsive_token_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/oauth/token")
}
