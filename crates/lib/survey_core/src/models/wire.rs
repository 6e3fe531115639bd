//! JSON shapes exchanged with the submission, token and QR endpoints.

use serde::{Deserialize, Serialize};

use super::building::BuildingTag;

/// Default lifetime requested for a one-time token.
pub const DEFAULT_EXPIRES_HOURS: u32 = 24;

/// `{ping: true}` — liveness/authorization probe for a credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PingRequest {
    pub ping: bool,
}

impl PingRequest {
    pub const fn new() -> Self {
        Self { ping: true }
    }
}

impl Default for PingRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of a one-time token request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueTokenRequest {
    #[serde(rename = "expiresHours")]
    pub expires_hours: u32,
    #[serde(rename = "building_Number")]
    pub building_number: BuildingTag,
}

/// Response of the token issuing endpoint. Any of the fields may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueTokenResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        rename = "oneTimeUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub one_time_url: Option<String>,
    /// RFC 3339 expiry, when the issuer reports it.
    #[serde(default, rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Response of the signed QR endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedQrResponse {
    pub url: String,
}

/// Error body returned by the proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// A survey submission as sent to the submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurveyPayload {
    pub role: super::survey::Role,
    pub student_number: Option<String>,
    pub username: Option<String>,
    pub satisfaction: u8,
    pub course_number: Option<String>,
    #[serde(rename = "building_Number")]
    pub building_number: Option<BuildingTag>,
    pub workshop: bool,
    pub token: Option<String>,
}
