//! Meeting SDK join signatures.
//!
//! A join signature is a compact HS256 token (`header.payload.signature`, each
//! segment base64url without padding) that lets a browser client enter one
//! meeting with one role for a limited time. It is signed with the SDK secret and
//! is unrelated to the OAuth access token used for the REST API.

mod claims;
mod generator;

pub use claims::{InvalidMeetingRole, JoinClaims, JoinHeader, MeetingRole};
pub use generator::{SdkCredentials, SignatureGenerator, CLOCK_SKEW_SECS, SIGNATURE_LIFETIME_SECS};
