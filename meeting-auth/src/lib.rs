//! # meeting-auth
//!
//! Short-lived credentials for the meeting vendor:
//! - OAuth 2.0 access tokens for the meeting REST API, acquired with the
//!   `account_credentials` grant and cached until shortly before they expire
//! - Meeting SDK join signatures that let a browser client enter one meeting
//!   with one role
//! - HTTP client building with timeout and retry middleware
//! - Bearer authentication of outgoing API requests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use meeting_auth::{
//!     http::HttpClientBuilder,
//!     oauth::{token::TokenCache, AccountCredentials, AccountCredentialsProvider},
//!     signature::{MeetingRole, SdkCredentials, SignatureGenerator},
//! };
//!
//! let provider = AccountCredentialsProvider::new(credentials, token_url, HttpClientBuilder::new().build()?)?;
//! let cache = TokenCache::new(provider);
//! let bearer = cache.get_access_token().await?;
//!
//! let signer = SignatureGenerator::new(SdkCredentials::new(sdk_key, sdk_secret));
//! let signature = signer.generate_signature("123456789", MeetingRole::Participant)?;
//! ```

pub mod bearer;
pub mod clock;
pub mod error;
pub mod http;
pub mod oauth;
pub mod signature;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
