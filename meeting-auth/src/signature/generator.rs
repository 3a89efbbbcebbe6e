//! HS256 join signature generation and verification.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;
use tracing::debug;

use super::{JoinClaims, JoinHeader, MeetingRole};
use crate::clock::{Clock, SystemClock};
use crate::error::{
    configuration_error, signature_error, ConfigurationErrorKind, Error, ErrorKind,
    SignatureErrorKind,
};

type HmacSha256 = Hmac<Sha256>;

/// `iat` is backdated by this many seconds to tolerate clock skew with the verifier.
pub const CLOCK_SKEW_SECS: i64 = 30;

/// Validity window of a join signature, counted from `iat`.
pub const SIGNATURE_LIFETIME_SECS: i64 = 2 * 60 * 60;

/// Meeting SDK key and secret.
#[derive(Debug, Clone, Default)]
pub struct SdkCredentials {
    pub sdk_key: Option<String>,
    pub sdk_secret: Option<SecretString>,
}

impl SdkCredentials {
    pub fn new(sdk_key: Option<String>, sdk_secret: Option<String>) -> Self {
        Self {
            sdk_key,
            sdk_secret: sdk_secret.map(SecretString::new),
        }
    }

    fn key(&self) -> Result<&str, Error> {
        self.sdk_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                configuration_error(
                    ConfigurationErrorKind::MissingSdkKey,
                    "Meeting SDK key is not configured",
                )
            })
    }

    fn secret(&self) -> Result<&[u8], Error> {
        self.sdk_secret
            .as_ref()
            .map(|secret| secret.expose_secret().as_bytes())
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| {
                configuration_error(
                    ConfigurationErrorKind::MissingSdkSecret,
                    "Meeting SDK secret is not configured",
                )
            })
    }
}

/// Builds join signatures for the Meeting SDK.
///
/// Pure computation: no I/O, no shared mutable state.
pub struct SignatureGenerator {
    credentials: SdkCredentials,
    clock: Arc<dyn Clock>,
}

impl SignatureGenerator {
    pub fn new(credentials: SdkCredentials) -> Self {
        Self::with_clock(credentials, Arc::new(SystemClock))
    }

    pub fn with_clock(credentials: SdkCredentials, clock: Arc<dyn Clock>) -> Self {
        Self { credentials, clock }
    }

    /// The configured SDK key, which browser clients need alongside the signature.
    pub fn sdk_key(&self) -> Result<&str, Error> {
        self.credentials.key()
    }

    /// Create a signature authorizing `role` in meeting `meeting_number`.
    ///
    /// The result is `base64url(header).base64url(payload).base64url(hmac)` with
    /// `iat = now - 30s` and `exp = tokenExp = iat + 2h`. Identical for identical
    /// clock readings.
    ///
    /// Whether the caller may request [`MeetingRole::Host`] is not checked here.
    ///
    /// # Errors
    ///
    /// `Configuration` when the SDK key or secret is missing.
    pub fn generate_signature(
        &self,
        meeting_number: &str,
        role: MeetingRole,
    ) -> Result<String, Error> {
        let app_key = self.credentials.key()?;
        let secret = self.credentials.secret()?;

        let iat = self.clock.now().timestamp() - CLOCK_SKEW_SECS;
        let exp = iat + SIGNATURE_LIFETIME_SECS;
        let claims = JoinClaims {
            app_key: app_key.to_string(),
            mn: meeting_number.to_string(),
            role,
            iat,
            exp,
            token_exp: exp,
        };

        let signing_input = format!(
            "{}.{}",
            encode_segment(&JoinHeader::default())?,
            encode_segment(&claims)?
        );
        let signature = URL_SAFE_NO_PAD.encode(sign(secret, signing_input.as_bytes())?);

        debug!(
            "Generated join signature for meeting {} as {} (exp {})",
            meeting_number, role, exp
        );

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Check a join signature produced with the same SDK secret and return its claims.
    ///
    /// # Errors
    ///
    /// * `Signature(Malformed)` when the token is not three base64url JSON segments.
    /// * `Signature(InvalidSignature)` when the HMAC does not match.
    /// * `Signature(Expired)` when `exp` is not in the future.
    pub fn verify(&self, token: &str) -> Result<JoinClaims, Error> {
        let secret = self.credentials.secret()?;

        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(signature_error(
                SignatureErrorKind::Malformed,
                "Expected three dot-separated segments",
            ));
        };

        let provided = URL_SAFE_NO_PAD.decode(signature).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Signature(SignatureErrorKind::Malformed),
        })?;

        let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| {
            signature_error(SignatureErrorKind::Encoding, "Invalid HMAC key")
        })?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&provided).map_err(|_| {
            signature_error(
                SignatureErrorKind::InvalidSignature,
                "Signature does not match header and payload",
            )
        })?;

        let header: JoinHeader = decode_segment(header)?;
        if header != JoinHeader::default() {
            return Err(signature_error(
                SignatureErrorKind::Malformed,
                &format!("Unsupported header alg={} typ={}", header.alg, header.typ),
            ));
        }

        let claims: JoinClaims = decode_segment(payload)?;
        if self.clock.now().timestamp() >= claims.exp {
            return Err(signature_error(
                SignatureErrorKind::Expired,
                "Join signature has expired",
            ));
        }

        Ok(claims)
    }
}

/// JSON-serialize `value` and encode it as base64url without padding.
fn encode_segment<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Signature(SignatureErrorKind::Encoding),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, Error> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Signature(SignatureErrorKind::Malformed),
    })?;
    serde_json::from_slice(&bytes).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Signature(SignatureErrorKind::Malformed),
    })
}

fn sign(secret: &[u8], signing_input: &[u8]) -> Result<Vec<u8>, Error> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| signature_error(SignatureErrorKind::Encoding, "Invalid HMAC key"))?;
    mac.update(signing_input);
    Ok(mac.finalize().into_bytes().to_vec())
}
