use serde::Deserialize;

use crate::constants::FrameType;
use crate::messages::ServerErrorFrame;

/// Errors decoding an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,
}

/// A decoded server frame.
///
/// Only the `type` field is interpreted; the full JSON body is kept so
/// result frames can be handed to callers untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub frame_type: FrameType,
    pub body: serde_json::Value,
}

impl InboundFrame {
    /// Parses a text frame. Frames without a `type` field decode as
    /// [`FrameType::Unknown`].
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let body: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(body)
    }

    pub fn from_value(body: serde_json::Value) -> Result<Self, FrameError> {
        let obj = body.as_object().ok_or(FrameError::NotAnObject)?;
        let frame_type = match obj.get("type") {
            Some(t) => FrameType::deserialize(t).unwrap_or(FrameType::Unknown),
            None => FrameType::Unknown,
        };
        Ok(Self { frame_type, body })
    }

    /// Deserializes the body into the given type.
    pub fn parse_body<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.body)
    }

    /// Returns the error details if this is an error frame.
    pub fn server_error(&self) -> Option<ServerErrorFrame> {
        if self.frame_type != FrameType::Error {
            return None;
        }
        Some(self.parse_body().unwrap_or_default())
    }

    pub fn into_body(self) -> serde_json::Value {
        self.body
    }
}
