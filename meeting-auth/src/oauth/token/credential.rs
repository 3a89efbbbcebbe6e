//! The cached bearer credential.

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

use crate::oauth::IssuedToken;

/// How long before the server-reported expiry a token stops being handed out.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

// Upper bound on a reported lifetime; keeps the timestamp arithmetic in range.
const MAX_LIFETIME_SECS: i64 = 366 * 24 * 60 * 60;

/// An access token together with the instant after which it must not be reused.
#[derive(Debug, Clone)]
pub struct CachedCredential {
    /// Bearer token for API requests.
    pub token: SecretString,
    /// Already reduced by [`EXPIRY_MARGIN_SECS`] relative to the server's view.
    pub expires_at: DateTime<Utc>,
}

impl CachedCredential {
    /// Build the cache entry for a token obtained by an exchange that started at `acquired_at`.
    pub fn from_issued(issued: IssuedToken, acquired_at: DateTime<Utc>) -> Self {
        let lifetime = i64::try_from(issued.expires_in)
            .unwrap_or(MAX_LIFETIME_SECS)
            .min(MAX_LIFETIME_SECS);
        Self {
            token: issued.access_token,
            expires_at: acquired_at + Duration::seconds(lifetime - EXPIRY_MARGIN_SECS),
        }
    }

    /// True while `now` is strictly before the recorded expiry.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Get the remaining time until expiration.
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}
