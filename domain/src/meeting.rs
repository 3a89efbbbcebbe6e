//! Meeting orchestration: who may create meetings, how clients find them, and
//! who may join them as host.
//!
//! Only administrators create meetings and receive host join signatures. Any
//! caller may look up a meeting and receive a participant signature.

use async_trait::async_trait;
use log::*;
use meeting_auth::oauth::Provider;
use meeting_auth::signature::{MeetingRole, SignatureGenerator};
use serde::Serialize;

use crate::error::{Error, InternalErrorKind};
use crate::gateway::zoom::{self, CreateMeetingRequest, Meeting};

/// Platform role of the user making a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Remote meeting management, implemented by the vendor clients in [`crate::gateway`].
#[async_trait]
pub trait MeetingGateway: Send + Sync {
    async fn create_meeting(&self, request: &CreateMeetingRequest) -> Result<Meeting, Error>;

    async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, Error>;

    fn join_url(&self, meeting: &Meeting) -> Result<String, Error>;
}

#[async_trait]
impl<P: Provider> MeetingGateway for zoom::Client<P> {
    async fn create_meeting(&self, request: &CreateMeetingRequest) -> Result<Meeting, Error> {
        zoom::Client::create_meeting(self, request).await
    }

    async fn get_meeting(&self, meeting_id: &str) -> Result<Meeting, Error> {
        zoom::Client::get_meeting(self, meeting_id).await
    }

    fn join_url(&self, meeting: &Meeting) -> Result<String, Error> {
        zoom::Client::join_url(self, meeting)
    }
}

/// A meeting together with the link a browser uses to join it.
///
/// `meeting` carries every field Zoom returned. `join_url` is computed from the
/// configured join base and takes precedence over `meeting.join_url`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JoinDetails {
    pub meeting: Meeting,
    pub join_url: String,
}

/// Everything the browser Meeting SDK needs to join a meeting.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JoinAuthorization {
    pub signature: String,
    pub sdk_key: String,
    pub meeting_number: String,
    pub role: MeetingRole,
}

pub struct MeetingService<G: MeetingGateway> {
    gateway: G,
    signer: SignatureGenerator,
}

impl<G: MeetingGateway> MeetingService<G> {
    pub fn new(gateway: G, signer: SignatureGenerator) -> Self {
        Self { gateway, signer }
    }

    /// Schedule a new meeting. Restricted to administrators.
    pub async fn create_meeting(
        &self,
        caller: UserRole,
        request: CreateMeetingRequest,
    ) -> Result<Meeting, Error> {
        if !caller.is_admin() {
            warn!("Rejected meeting creation by non-admin caller");
            return Err(Error::internal(
                InternalErrorKind::Unauthorized,
                "Only administrators can create meetings",
            ));
        }
        if request.topic.trim().is_empty() {
            return Err(Error::internal(
                InternalErrorKind::Invalid,
                "Meeting topic is required",
            ));
        }
        if request.duration_minutes == 0 {
            return Err(Error::internal(
                InternalErrorKind::Invalid,
                "Meeting duration must be at least one minute",
            ));
        }

        self.gateway.create_meeting(&request).await
    }

    /// Look up a meeting and compute its join link.
    ///
    /// `meeting_id` must be a numeric Zoom meeting ID.
    pub async fn join_meeting(&self, meeting_id: &str) -> Result<JoinDetails, Error> {
        let meeting_id = meeting_id.trim();
        if meeting_id.is_empty() {
            return Err(Error::internal(
                InternalErrorKind::Invalid,
                "Meeting ID is required",
            ));
        }
        if !meeting_id.bytes().all(|b| b.is_ascii_digit()) {
            warn!("Rejected non-numeric meeting ID {:?}", meeting_id);
            return Err(Error::internal(
                InternalErrorKind::Invalid,
                "Meeting ID must be numeric",
            ));
        }

        debug!("Joining meeting {}", meeting_id);

        let meeting = self.gateway.get_meeting(meeting_id).await?;
        let join_url = self.gateway.join_url(&meeting)?;
        Ok(JoinDetails { meeting, join_url })
    }

    /// Sign a join authorization for `meeting_number`.
    ///
    /// Host signatures are only issued to administrators.
    pub fn authorize_join(
        &self,
        caller: UserRole,
        meeting_number: &str,
        role: MeetingRole,
    ) -> Result<JoinAuthorization, Error> {
        let meeting_number = meeting_number.trim();
        if meeting_number.is_empty() {
            return Err(Error::internal(
                InternalErrorKind::Invalid,
                "meetingNumber is required",
            ));
        }
        if role == MeetingRole::Host && !caller.is_admin() {
            warn!(
                "Rejected host join signature for meeting {} requested by non-admin caller",
                meeting_number
            );
            return Err(Error::internal(
                InternalErrorKind::Unauthorized,
                "Only administrators can join as host",
            ));
        }

        let signature = self.signer.generate_signature(meeting_number, role)?;

        Ok(JoinAuthorization {
            signature,
            sdk_key: self.signer.sdk_key()?.to_string(),
            meeting_number: meeting_number.to_string(),
            role,
        })
    }
}
