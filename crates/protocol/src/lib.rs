//! Wire protocol types for the inkwire recognition-session WebSocket.

pub mod auth;
pub mod constants;
pub mod envelope;
pub mod frames;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::FrameType;
pub use envelope::{FrameError, InboundFrame};
pub use messages::{
    ApplicationKeyMessage, HmacChallenge, HmacMessage, ResetMessage, ServerErrorFrame,
};
pub use types::{Component, MathParameter, Stroke, TextParameter};
