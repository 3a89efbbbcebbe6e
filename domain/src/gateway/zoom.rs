//! Zoom REST API client for creating and looking up meetings.
//!
//! Every request is authorized with the access token held by the shared
//! [`TokenCache`]. When Zoom answers 401 for a token the cache still considered
//! valid, the cache is invalidated and the request is sent once more with a
//! freshly acquired token.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::*;
use meeting_auth::bearer::BearerTokenAuth;
use meeting_auth::error::Error as MeetingAuthError;
use meeting_auth::http::{HttpClient, RequestBuilder};
use meeting_auth::oauth::{token::TokenCache, Provider};
use reqwest::StatusCode;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{DomainErrorKind, Error, ExternalErrorKind, InternalErrorKind};

/// Zoom meeting type for a meeting scheduled at a fixed time.
const SCHEDULED_MEETING: u8 = 2;

/// Default meeting length in minutes.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Meeting settings applied to every meeting this service creates.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MeetingSettings {
    pub host_video: bool,
    pub participant_video: bool,
    pub join_before_host: bool,
    pub mute_upon_entry: bool,
    /// 0 = attendees are approved automatically
    pub approval_type: u8,
    pub waiting_room: bool,
    pub auto_recording: String,
}

impl Default for MeetingSettings {
    fn default() -> Self {
        Self {
            host_video: true,
            participant_video: true,
            join_before_host: true,
            mute_upon_entry: true,
            approval_type: 0,
            waiting_room: true,
            auto_recording: "local".to_string(),
        }
    }
}

/// Parameters for a new scheduled meeting.
#[derive(Debug, Clone)]
pub struct CreateMeetingRequest {
    pub topic: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
}

#[derive(Debug, Serialize)]
struct CreateMeetingBody<'a> {
    topic: &'a str,
    #[serde(rename = "type")]
    meeting_type: u8,
    start_time: String,
    duration: u32,
    timezone: &'static str,
    settings: MeetingSettings,
}

/// A meeting as returned by the Zoom API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: u64,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub join_url: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub host_id: Option<String>,
    /// Every other field Zoom returned, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Zoom API client
pub struct Client<P: Provider> {
    http_client: HttpClient,
    token_cache: Arc<TokenCache<P>>,
    base_url: String,
    join_base_url: String,
}

impl<P: Provider> Client<P> {
    /// Create a new Zoom client.
    ///
    /// * `base_url` - REST API base, e.g. `https://api.zoom.us/v2`
    /// * `join_base_url` - base for browser join links, e.g. `https://zoom.us/j`
    pub fn new(
        http_client: HttpClient,
        token_cache: Arc<TokenCache<P>>,
        base_url: &str,
        join_base_url: &str,
    ) -> Self {
        Self {
            http_client,
            token_cache,
            base_url: base_url.trim_end_matches('/').to_string(),
            join_base_url: join_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Schedule a meeting owned by the account's own user.
    pub async fn create_meeting(&self, request: &CreateMeetingRequest) -> Result<Meeting, Error> {
        let url = self.api_url(&["users", "me", "meetings"])?;
        let body = CreateMeetingBody {
            topic: &request.topic,
            meeting_type: SCHEDULED_MEETING,
            start_time: request.start_time.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            duration: request.duration_minutes,
            timezone: "UTC",
            settings: MeetingSettings::default(),
        };

        debug!("Creating Zoom meeting \"{}\"", request.topic);

        let response = self
            .send_authorized(|| self.http_client.post(url.clone()).json(&body))
            .await?;
        let meeting: Meeting = parse_response(response).await?;

        info!("Created Zoom meeting: {}", meeting.id);
        Ok(meeting)
    }

    /// Look up a meeting by its Zoom meeting ID.
    pub async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, Error> {
        let url = self.api_url(&["meetings", meeting_id])?;

        debug!("Fetching Zoom meeting {}", meeting_id);

        let response = self
            .send_authorized(|| self.http_client.get(url.clone()))
            .await?;
        parse_response(response).await
    }

    /// Browser join link for `meeting`, carrying the meeting password when there is one.
    pub fn join_url(&self, meeting: &Meeting) -> Result<String, Error> {
        let mut url = reqwest::Url::parse(&format!("{}/{}", self.join_base_url, meeting.id))
            .map_err(|e| {
                warn!("Invalid Zoom join base URL {}: {:?}", self.join_base_url, e);
                Error {
                    source: Some(Box::new(e)),
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Config),
                }
            })?;

        if let Some(password) = meeting.password.as_deref().filter(|p| !p.is_empty()) {
            url.query_pairs_mut().append_pair("pwd", password);
        }

        Ok(url.to_string())
    }

    async fn send_authorized<F>(&self, build: F) -> Result<reqwest::Response, Error>
    where
        F: Fn() -> RequestBuilder,
    {
        let token = self.token_cache.get_access_token().await?;
        let response = send_with_token(&build, token.clone()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!("Zoom API rejected the cached access token, acquiring a new one");
        self.token_cache.invalidate(&token).await;
        let token = self.token_cache.get_access_token().await?;
        send_with_token(&build, token).await
    }

    /// `base_url` with `segments` appended, each percent-encoded as a single path segment.
    fn api_url(&self, segments: &[&str]) -> Result<reqwest::Url, Error> {
        let invalid_base = || {
            warn!("Invalid Zoom API base URL {}", self.base_url);
            Error::internal(InternalErrorKind::Config, "Invalid Zoom API base URL")
        };

        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn send_with_token<F>(build: &F, token: SecretString) -> Result<reqwest::Response, Error>
where
    F: Fn() -> RequestBuilder,
{
    let response = BearerTokenAuth::new(token)
        .authenticate(build())
        .send()
        .await
        .map_err(|e| {
            warn!("Failed to reach Zoom API: {:?}", e);
            MeetingAuthError::from(e)
        })?;
    Ok(response)
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();

    if status.is_success() {
        return response.json().await.map_err(|e| {
            warn!("Failed to parse Zoom API response: {:?}", e);
            Error {
                source: Some(Box::new(e)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::Other(
                    "Invalid response from Zoom API".to_string(),
                )),
            }
        });
    }

    let error_text = response.text().await.unwrap_or_default();
    warn!("Zoom API error {}: {}", status, error_text);

    let kind = match status {
        StatusCode::NOT_FOUND => ExternalErrorKind::NotFound,
        StatusCode::UNAUTHORIZED => ExternalErrorKind::Authentication,
        _ => ExternalErrorKind::Other(error_text),
    };
    Err(Error::external(kind, &format!("Zoom API responded with {status}")))
}
