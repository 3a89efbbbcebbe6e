//! OAuth 2.0 access tokens for the meeting vendor's REST API.
//!
//! The vendor issues short-lived bearer tokens through an `account_credentials`
//! grant. [`AccountCredentialsProvider`] performs the exchange and
//! [`token::TokenCache`] keeps the current token until shortly before it expires.

mod account_credentials;
mod provider;

pub mod token;

pub use account_credentials::{AccountCredentials, AccountCredentialsProvider};
pub use provider::{IssuedToken, Provider};
