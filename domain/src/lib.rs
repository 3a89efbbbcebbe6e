//! Meeting orchestration on top of `meeting-auth`.
//!
//! Consumers of this crate work with [`broker::Broker`], [`meeting::MeetingService`]
//! and the [`error::Error`] tree, and do not need to depend on `meeting-auth`
//! directly for the common types re-exported here.
pub use meeting_auth::signature::MeetingRole;

pub mod broker;
pub mod error;
pub mod gateway;
pub mod meeting;

pub use broker::Broker;
pub use meeting::{JoinAuthorization, JoinDetails, MeetingService, UserRole};
