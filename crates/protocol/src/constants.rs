use serde::{Deserialize, Serialize};

/// Maximum inbound message size in bytes (16 MB).
pub const WS_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Close status used when a recognizer is released (RFC 6455 normal closure).
pub const WS_CLOSE_NORMAL: u16 = 1000;

/// Human-readable reason sent with [`WS_CLOSE_NORMAL`].
pub const WS_CLOSE_REASON_CLEAR: &str = "CLEAR";

/// Server scheme that selects a secure WebSocket (`wss`).
pub const SECURE_SCHEME: &str = "https";

/// Default recognition server host.
pub const DEFAULT_HOST: &str = "cloud.myscript.com";

/// Path suffix of the math recognition endpoint.
pub const MATH_WS_SUFFIX: &str = "/api/v3.0/recognition/ws/math";

/// Path suffix of the text recognition endpoint.
pub const TEXT_WS_SUFFIX: &str = "/api/v3.0/recognition/ws/text";

/// Text input type used for free-form handwriting.
pub const TEXT_INPUT_MULTI_LINE: &str = "MULTI_LINE_TEXT";

/// WebSocket frame type identifier (the `type` field of every frame).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    // Handshake
    #[serde(rename = "applicationKey")]
    ApplicationKey,
    #[serde(rename = "hmacChallenge")]
    HmacChallenge,
    #[serde(rename = "hmac")]
    Hmac,
    #[serde(rename = "init")]
    Init,

    // Recognition input
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "continue")]
    Continue,
    #[serde(rename = "reset")]
    Reset,

    // Server results
    #[serde(rename = "mathResult")]
    MathResult,
    #[serde(rename = "textResult")]
    TextResult,
    #[serde(rename = "error")]
    Error,

    /// Forward compatibility: unknown frame types deserialize here.
    #[serde(other)]
    Unknown,
}

impl FrameType {
    /// Returns the wire name of this frame type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApplicationKey => "applicationKey",
            Self::HmacChallenge => "hmacChallenge",
            Self::Hmac => "hmac",
            Self::Init => "init",
            Self::Start => "start",
            Self::Continue => "continue",
            Self::Reset => "reset",
            Self::MathResult => "mathResult",
            Self::TextResult => "textResult",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}
