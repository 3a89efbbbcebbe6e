//! Error types for the `meeting-auth` crate.
//!
//! Follows the same pattern as domain::error with a root Error struct and error kind enums.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for meeting-auth crate.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in meeting-auth.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Configuration(ConfigurationErrorKind),
    Authentication(AuthenticationErrorKind),
    Signature(SignatureErrorKind),
    Http(HttpErrorKind),
}

/// A required credential or endpoint is missing or unusable.
/// Never retried; the operator has to fix the configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigurationErrorKind {
    MissingAccountId,
    MissingClientId,
    MissingClientSecret,
    MissingSdkKey,
    MissingSdkSecret,
    InvalidUrl,
}

/// The OAuth account-credentials exchange did not yield a usable token.
#[derive(Debug, PartialEq)]
pub enum AuthenticationErrorKind {
    Network,
    Timeout,
    Rejected,
    InvalidResponse,
}

/// Errors from building or checking join signatures.
#[derive(Debug, PartialEq)]
pub enum SignatureErrorKind {
    Encoding,
    Malformed,
    InvalidSignature,
    Expired,
}

/// Errors from HTTP client operations.
#[derive(Debug, PartialEq)]
pub enum HttpErrorKind {
    BuilderFailed,
    RequestFailed,
    Network,
}

impl Error {
    /// True for any missing or invalid configuration value.
    pub fn is_configuration(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Configuration(_))
    }

    /// True when the remote authorization exchange failed for any reason.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self.error_kind, ErrorKind::Authentication(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Configuration(kind) => write!(f, "Configuration error: {:?}", kind)?,
            ErrorKind::Authentication(kind) => write!(f, "Authentication failure: {:?}", kind)?,
            ErrorKind::Signature(kind) => write!(f, "Signature error: {:?}", kind)?,
            ErrorKind::Http(kind) => write!(f, "HTTP error: {:?}", kind)?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let error_kind = if err.is_builder() {
            ErrorKind::Http(HttpErrorKind::BuilderFailed)
        } else if err.is_request() {
            ErrorKind::Http(HttpErrorKind::RequestFailed)
        } else {
            ErrorKind::Http(HttpErrorKind::Network)
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            other => Error {
                source: Some(Box::new(other)),
                error_kind: ErrorKind::Http(HttpErrorKind::Network),
            },
        }
    }
}

/// Helper function to create configuration errors.
pub fn configuration_error(kind: ConfigurationErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Configuration(kind),
    }
}

/// Helper function to create authentication errors.
pub fn authentication_error(kind: AuthenticationErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Authentication(kind),
    }
}

/// Helper function to create signature errors.
pub fn signature_error(kind: SignatureErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Signature(kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates_match_kind() {
        let err = configuration_error(ConfigurationErrorKind::MissingSdkKey, "no key");
        assert!(err.is_configuration());
        assert!(!err.is_authentication_failure());

        let err = authentication_error(AuthenticationErrorKind::Rejected, "401");
        assert!(err.is_authentication_failure());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = authentication_error(AuthenticationErrorKind::Timeout, "took too long");
        assert_eq!(
            err.to_string(),
            "Authentication failure: Timeout (took too long)"
        );
    }
}
