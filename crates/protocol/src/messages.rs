use serde::{Deserialize, Serialize};

use crate::auth;
use crate::constants::FrameType;

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// First handshake frame, sent as soon as the socket opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationKeyMessage {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    pub application_key: String,
}

impl ApplicationKeyMessage {
    pub fn new(application_key: impl Into<String>) -> Self {
        Self {
            frame_type: FrameType::ApplicationKey,
            application_key: application_key.into(),
        }
    }
}

/// Answer to an [`HmacChallenge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmacMessage {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    pub application_key: String,
    pub challenge: String,
    pub hmac: String,
}

impl HmacMessage {
    /// Signs `challenge` with the application and HMAC keys.
    pub fn answer(challenge: &HmacChallenge, application_key: &str, hmac_key: &str) -> Self {
        Self {
            frame_type: FrameType::Hmac,
            application_key: application_key.to_string(),
            challenge: challenge.challenge.clone(),
            hmac: auth::compute_hmac(&challenge.challenge, application_key, hmac_key),
        }
    }
}

/// Asks the server to drop its recognition context for this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetMessage {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
}

impl Default for ResetMessage {
    fn default() -> Self {
        Self {
            frame_type: FrameType::Reset,
        }
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Challenge the server issues after receiving the application key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HmacChallenge {
    pub challenge: String,
}

/// Error frame body.
///
/// Servers are inconsistent about where the human-readable text lives, so
/// both `message` and `error` are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerErrorFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerErrorFrame {
    /// Best-effort description of the failure.
    pub fn describe(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "unknown server error".into())
    }

    /// Error code rendered as text, if the server sent one.
    pub fn code_text(&self) -> Option<String> {
        self.code.as_ref().map(|c| match c {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}
