//! Header and payload of a Meeting SDK join signature.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role a client joins a meeting with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum MeetingRole {
    Participant = 0,
    Host = 1,
}

/// A role value outside `{0, 1}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMeetingRole(pub String);

impl fmt::Display for InvalidMeetingRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid meeting role {:?}: expected 0 (participant) or 1 (host)",
            self.0
        )
    }
}

impl std::error::Error for InvalidMeetingRole {}

impl From<MeetingRole> for u8 {
    fn from(role: MeetingRole) -> Self {
        role as u8
    }
}

impl TryFrom<u8> for MeetingRole {
    type Error = InvalidMeetingRole;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MeetingRole::Participant),
            1 => Ok(MeetingRole::Host),
            other => Err(InvalidMeetingRole(other.to_string())),
        }
    }
}

impl FromStr for MeetingRole {
    type Err = InvalidMeetingRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| InvalidMeetingRole(s.to_string()))
            .and_then(MeetingRole::try_from)
    }
}

impl fmt::Display for MeetingRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MeetingRole::Participant => write!(f, "participant"),
            MeetingRole::Host => write!(f, "host"),
        }
    }
}

/// JOSE header. Serialized as `{"alg":"HS256","typ":"JWT"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for JoinHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims the Meeting SDK checks before letting a client join.
///
/// Field order is the serialization order and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClaims {
    /// Meeting SDK key.
    #[serde(rename = "appKey")]
    pub app_key: String,
    /// Meeting number, kept as an opaque string.
    pub mn: String,
    pub role: MeetingRole,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds.
    pub exp: i64,
    /// SDK session expiry; always equal to `exp`.
    #[serde(rename = "tokenExp")]
    pub token_exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&MeetingRole::Host).unwrap(), "1");
        assert_eq!(
            serde_json::to_string(&MeetingRole::Participant).unwrap(),
            "0"
        );
        assert_eq!(
            serde_json::from_str::<MeetingRole>("1").unwrap(),
            MeetingRole::Host
        );
        assert!(serde_json::from_str::<MeetingRole>("2").is_err());
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("0".parse::<MeetingRole>().unwrap(), MeetingRole::Participant);
        assert_eq!(" 1 ".parse::<MeetingRole>().unwrap(), MeetingRole::Host);
        assert!("2".parse::<MeetingRole>().is_err());
        assert!("host".parse::<MeetingRole>().is_err());
    }

    #[test]
    fn test_header_serialization_order() {
        assert_eq!(
            serde_json::to_string(&JoinHeader::default()).unwrap(),
            r#"{"alg":"HS256","typ":"JWT"}"#
        );
    }

    #[test]
    fn test_claims_serialization_order() {
        let claims = JoinClaims {
            app_key: "key".to_string(),
            mn: "123".to_string(),
            role: MeetingRole::Participant,
            iat: 10,
            exp: 7210,
            token_exp: 7210,
        };
        assert_eq!(
            serde_json::to_string(&claims).unwrap(),
            r#"{"appKey":"key","mn":"123","role":0,"iat":10,"exp":7210,"tokenExp":7210}"#
        );
    }
}
