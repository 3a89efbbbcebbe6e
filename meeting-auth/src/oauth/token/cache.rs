//! Process-wide access token cache.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::CachedCredential;
use crate::clock::{now_seconds, Clock, SystemClock};
use crate::error::Error;
use crate::oauth::Provider;

/// Caches the vendor access token and re-acquires it lazily once it nears expiry.
///
/// One instance is built at startup and shared behind an `Arc`. Reads of an
/// unexpired token only take the shared side of an `RwLock`. Acquisition is
/// serialized by `acquire_lock` and re-checks the cache after the lock is taken,
/// so callers racing past expiry trigger a single exchange and all receive its
/// token. A failed exchange leaves the cached state untouched.
pub struct TokenCache<P: Provider> {
    provider: P,
    clock: Arc<dyn Clock>,
    state: RwLock<Option<CachedCredential>>,
    acquire_lock: Mutex<()>,
}

impl<P: Provider> TokenCache<P> {
    /// Create an empty cache backed by `provider` and the system clock.
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, Arc::new(SystemClock))
    }

    /// Create an empty cache with an explicit clock.
    pub fn with_clock(provider: P, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            state: RwLock::new(None),
            acquire_lock: Mutex::new(()),
        }
    }

    /// Get a bearer token for the meeting API, acquiring a new one if needed.
    ///
    /// Returns the cached token without any network traffic while the current
    /// time is strictly before its recorded expiry.
    ///
    /// # Errors
    ///
    /// * `Configuration` when the account credentials are incomplete.
    /// * `Authentication` when the exchange fails.
    pub async fn get_access_token(&self) -> Result<SecretString, Error> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _guard = self.acquire_lock.lock().await;

        // Another caller may have completed an exchange while we waited.
        if let Some(token) = self.fresh_token().await {
            debug!("Access token was acquired by a concurrent caller");
            return Ok(token);
        }

        let acquired_at = now_seconds(self.clock.as_ref());
        let issued = self.provider.request_token().await?;
        let credential = CachedCredential::from_issued(issued, acquired_at);
        let token = credential.token.clone();

        info!(
            "Acquired access token valid for {}s",
            credential.time_until_expiry(acquired_at).num_seconds()
        );

        *self.state.write().await = Some(credential);

        Ok(token)
    }

    /// Drop `rejected` from the cache so the next call performs a fresh exchange.
    ///
    /// Used when the meeting API rejects a token the cache still considered valid.
    /// A no-op if the cache already holds a different token.
    pub async fn invalidate(&self, rejected: &SecretString) {
        let _guard = self.acquire_lock.lock().await;
        let mut state = self.state.write().await;
        if state
            .as_ref()
            .is_some_and(|cached| cached.token.expose_secret() == rejected.expose_secret())
        {
            *state = None;
            debug!("Cached access token invalidated");
        }
    }

    /// Snapshot of the cached credential, which may already be expired.
    pub async fn cached(&self) -> Option<CachedCredential> {
        self.state.read().await.clone()
    }

    async fn fresh_token(&self) -> Option<SecretString> {
        let now = self.clock.now();
        self.state
            .read()
            .await
            .as_ref()
            .filter(|credential| credential.is_fresh_at(now))
            .map(|credential| credential.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::{authentication_error, AuthenticationErrorKind, ErrorKind};
    use crate::http::HttpClientBuilder;
    use crate::oauth::account_credentials::unresponsive_token_url;
    use crate::oauth::{AccountCredentials, AccountCredentialsProvider, IssuedToken};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use mockito::{Matcher, Server, ServerGuard};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const T: i64 = 1_700_000_000;

    fn seeded(token: &str, expires_at: i64) -> CachedCredential {
        CachedCredential {
            token: SecretString::new(token.to_string()),
            expires_at: Utc.timestamp_opt(expires_at, 0).unwrap(),
        }
    }

    fn http_cache(
        server: &ServerGuard,
        clock: Arc<ManualClock>,
    ) -> TokenCache<AccountCredentialsProvider> {
        let http_client = HttpClientBuilder::new().with_max_retries(0).build().unwrap();
        let provider = AccountCredentialsProvider::new(
            AccountCredentials::new(
                Some("acct".to_string()),
                Some("client".to_string()),
                Some("secret".to_string()),
            ),
            &format!("{}/oauth/token", server.url()),
            http_client,
        )
        .unwrap();
        TokenCache::with_clock(provider, clock)
    }

    async fn token_endpoint(
        server: &mut ServerGuard,
        token: &str,
        expires_in: u64,
        hits: usize,
    ) -> mockito::Mock {
        server
            .mock("POST", "/oauth/token")
            .match_query(Matcher::Any)
            .expect(hits)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"access_token":"{token}","token_type":"bearer","expires_in":{expires_in}}}"#
            ))
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_fresh_cached_token_is_returned_without_exchange() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let clock = Arc::new(ManualClock::new(T));
        let cache = http_cache(&server, clock);
        *cache.state.write().await = Some(seeded("cached", T + 120));

        let token = cache.get_access_token().await.unwrap();

        assert_eq!(token.expose_secret(), "cached");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_cached_token_triggers_one_exchange() {
        let mut server = Server::new_async().await;
        let mock = token_endpoint(&mut server, "renewed", 3600, 1).await;
        let clock = Arc::new(ManualClock::new(T));
        let cache = http_cache(&server, clock);
        *cache.state.write().await = Some(seeded("stale", T - 1));

        let token = cache.get_access_token().await.unwrap();

        assert_eq!(token.expose_secret(), "renewed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_recorded_expiry_subtracts_safety_margin() {
        let mut server = Server::new_async().await;
        let _mock = token_endpoint(&mut server, "tok", 3600, 1).await;
        let clock = Arc::new(ManualClock::new(T));
        let cache = http_cache(&server, clock);

        cache.get_access_token().await.unwrap();

        let cached = cache.cached().await.unwrap();
        assert_eq!(cached.expires_at.timestamp(), T + 3600 - 60);
    }

    #[tokio::test]
    async fn test_token_reused_until_expiry_then_reacquired() {
        let mut server = Server::new_async().await;
        let first = token_endpoint(&mut server, "first", 3600, 1).await;
        let clock = Arc::new(ManualClock::new(T));
        let cache = http_cache(&server, clock.clone());

        assert_eq!(cache.get_access_token().await.unwrap().expose_secret(), "first");
        clock.advance(Duration::seconds(3539));
        assert_eq!(cache.get_access_token().await.unwrap().expose_secret(), "first");
        first.assert_async().await;

        first.remove_async().await;
        let second = token_endpoint(&mut server, "second", 3600, 1).await;
        clock.advance(Duration::seconds(1));

        assert_eq!(cache.get_access_token().await.unwrap().expose_secret(), "second");
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_exchange_propagates_and_keeps_previous_state() {
        let mut server = Server::new_async().await;
        let rejected = server
            .mock("POST", "/oauth/token")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"reason":"Invalid client_id or client_secret"}"#)
            .create_async()
            .await;
        let clock = Arc::new(ManualClock::new(T));
        let cache = http_cache(&server, clock);
        *cache.state.write().await = Some(seeded("stale", T - 1));

        let err = cache.get_access_token().await.unwrap_err();

        assert!(err.is_authentication_failure());
        let cached = cache.cached().await.unwrap();
        assert_eq!(cached.token.expose_secret(), "stale");
        assert_eq!(cached.expires_at.timestamp(), T - 1);

        rejected.remove_async().await;
        let _accepted = token_endpoint(&mut server, "recovered", 3600, 1).await;

        let token = cache.get_access_token().await.unwrap();
        assert_eq!(token.expose_secret(), "recovered");
        assert_eq!(
            cache.cached().await.unwrap().expires_at.timestamp(),
            T + 3600 - 60
        );
    }

    #[tokio::test]
    async fn test_timed_out_exchange_keeps_previous_state() {
        let http_client = HttpClientBuilder::new()
            .with_timeout(std::time::Duration::from_millis(200))
            .with_max_retries(0)
            .build()
            .unwrap();
        let provider = AccountCredentialsProvider::new(
            AccountCredentials::new(
                Some("acct".to_string()),
                Some("client".to_string()),
                Some("secret".to_string()),
            ),
            &unresponsive_token_url().await,
            http_client,
        )
        .unwrap();
        let cache = TokenCache::with_clock(provider, Arc::new(ManualClock::new(T)));
        *cache.state.write().await = Some(seeded("stale", T - 1));

        let err = cache.get_access_token().await.unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Authentication(AuthenticationErrorKind::Timeout)
        );
        let cached = cache.cached().await.unwrap();
        assert_eq!(cached.token.expose_secret(), "stale");
        assert_eq!(cached.expires_at.timestamp(), T - 1);
    }

    #[tokio::test]
    async fn test_configuration_error_leaves_cache_empty() {
        let provider = AccountCredentialsProvider::new(
            AccountCredentials::default(),
            "http://127.0.0.1:9/oauth/token",
            HttpClientBuilder::new().build().unwrap(),
        )
        .unwrap();
        let cache = TokenCache::new(provider);

        let err = cache.get_access_token().await.unwrap_err();

        assert!(err.is_configuration());
        assert!(cache.cached().await.is_none());
    }

    /// Issues `tok-<n>` tokens, counting exchanges. Optionally fails every call.
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl Provider for CountingProvider {
        async fn request_token(&self) -> Result<IssuedToken, Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            // Give concurrent callers time to pile up behind the acquisition lock.
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            if self.fail {
                return Err(authentication_error(
                    AuthenticationErrorKind::Network,
                    "connection reset",
                ));
            }
            Ok(IssuedToken {
                access_token: SecretString::new(format!("tok-{n}")),
                expires_in: 3600,
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_exchange() {
        let cache = Arc::new(TokenCache::new(CountingProvider::new(false)));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_access_token().await })
            })
            .collect();

        for handle in handles {
            let token = handle.await.unwrap().unwrap();
            assert_eq!(token.expose_secret(), "tok-1");
        }
        assert_eq!(cache.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_each_call_after_failure_retries_exchange() {
        let cache = TokenCache::new(CountingProvider::new(true));

        for _ in 0..2 {
            let err = cache.get_access_token().await.unwrap_err();
            assert_eq!(
                err.error_kind,
                ErrorKind::Authentication(AuthenticationErrorKind::Network)
            );
        }
        assert_eq!(cache.provider.calls.load(Ordering::SeqCst), 2);
        assert!(cache.cached().await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_exchange() {
        let cache = TokenCache::new(CountingProvider::new(false));

        let rejected = cache.get_access_token().await.unwrap();
        assert_eq!(rejected.expose_secret(), "tok-1");
        assert_eq!(cache.get_access_token().await.unwrap().expose_secret(), "tok-1");

        cache.invalidate(&rejected).await;

        assert_eq!(cache.get_access_token().await.unwrap().expose_secret(), "tok-2");
        assert_eq!(cache.provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidating_superseded_token_keeps_current_one() {
        let cache = TokenCache::new(CountingProvider::new(false));

        let first = cache.get_access_token().await.unwrap();
        cache.invalidate(&first).await;
        let second = cache.get_access_token().await.unwrap();
        assert_eq!(second.expose_secret(), "tok-2");

        // A late rejection of the first token must not evict its replacement.
        cache.invalidate(&first).await;

        assert_eq!(cache.get_access_token().await.unwrap().expose_secret(), "tok-2");
        assert_eq!(cache.provider.calls.load(Ordering::SeqCst), 2);
    }
}
