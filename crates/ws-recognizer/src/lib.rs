//! Persistent-connection recognition sessions.
//!
//! A [`WsRecognizer`] drives one long-lived WebSocket per [`SessionState`]:
//! it performs the server's HMAC handshake, sends the first request of a
//! session as a start frame and every later one as a continue frame, and
//! settles each request's [`ResultFuture`] as responses arrive, oldest
//! request first.

pub mod config;
pub mod deferred;
mod dispatcher;
pub mod recognizer;
pub mod session;
pub mod stroke_source;
pub mod transport;
pub mod ws_transport;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{RecognitionConfig, ServerConfig};
pub use deferred::{Deferred, Settler, deferred};
pub use recognizer::{
    BuildContinue, BuildStart, HandshakeFuture, OnResult, ResultFuture, WsRecognizer,
};
pub use session::SessionState;
pub use stroke_source::{InkModel, StrokeSource};
pub use transport::{Connector, InboundHandler, Transport, TransportEvent};
pub use ws_transport::WsConnector;

/// Errors raised by a transport adapter.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connection closed")]
    Closed,
}

/// Errors surfaced through handshake and result futures.
///
/// Cloneable so one handshake outcome can be observed by every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecognizerError {
    #[error("session not initialized")]
    NotInitialized,

    #[error("connection closed")]
    Closed,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server error: {message}")]
    Server {
        code: Option<String>,
        message: String,
    },

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<TransportError> for RecognizerError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => RecognizerError::Closed,
            other => RecognizerError::Transport(other.to_string()),
        }
    }
}
