//! Wires the credential broker together from a [`Config`].
//!
//! A single [`Broker`] is built at startup. It owns the shared access token cache
//! and the meeting service that draws on it, so every request in the process
//! reuses the same cached token.

use std::sync::Arc;
use std::time::Duration;

use log::*;
use meeting_auth::http::{HttpClient, HttpClientBuilder};
use meeting_auth::oauth::token::TokenCache;
use meeting_auth::oauth::{AccountCredentials, AccountCredentialsProvider};
use meeting_auth::signature::{SdkCredentials, SignatureGenerator};
use secrecy::SecretString;
use service::config::Config;

use crate::error::Error;
use crate::gateway::zoom;
use crate::meeting::MeetingService;

pub type ZoomTokenCache = TokenCache<AccountCredentialsProvider>;
pub type ZoomMeetingService = MeetingService<zoom::Client<AccountCredentialsProvider>>;

pub struct Broker {
    token_cache: Arc<ZoomTokenCache>,
    meetings: ZoomMeetingService,
}

impl Broker {
    /// Build the broker. No network traffic happens here; missing credentials
    /// only surface when an operation needs them.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = http_client(config)?;
        let token_cache = Arc::new(token_cache(config, http_client.clone())?);
        let gateway = zoom::Client::new(
            http_client,
            Arc::clone(&token_cache),
            config.zoom_api_base_url(),
            config.zoom_join_base_url(),
        );
        let meetings = MeetingService::new(gateway, signature_generator(config));

        debug!(
            "Broker configured for Zoom API at {}",
            config.zoom_api_base_url()
        );

        Ok(Self {
            token_cache,
            meetings,
        })
    }

    /// Current vendor access token, acquired or refreshed as needed.
    pub async fn access_token(&self) -> Result<SecretString, Error> {
        Ok(self.token_cache.get_access_token().await?)
    }

    pub fn meetings(&self) -> &ZoomMeetingService {
        &self.meetings
    }
}

fn http_client(config: &Config) -> Result<HttpClient, Error> {
    Ok(HttpClientBuilder::new()
        .with_timeout(Duration::from_secs(config.http_timeout_secs))
        .with_max_retries(config.http_max_retries)
        .build()?)
}

fn token_cache(config: &Config, http_client: HttpClient) -> Result<ZoomTokenCache, Error> {
    let credentials = AccountCredentials::new(
        config.zoom_account_id(),
        config.zoom_client_id(),
        config.zoom_client_secret(),
    );
    let provider =
        AccountCredentialsProvider::new(credentials, config.zoom_oauth_token_url(), http_client)?;
    Ok(TokenCache::new(provider))
}

fn signature_generator(config: &Config) -> SignatureGenerator {
    SignatureGenerator::new(SdkCredentials::new(config.sdk_key(), config.sdk_secret()))
}
