//! Transport adapter seam.
//!
//! A [`Connector`] opens one socket per session and reports everything that
//! happens on it to a single [`InboundHandler`]. The handler is given the
//! transport together with each event so it can reply without holding a
//! reference of its own.

use std::sync::Arc;

use serde::Serialize;

use crate::TransportError;

/// Something that happened on a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The socket is open; frames may now be exchanged.
    Open,
    /// A text frame arrived.
    Message(String),
    /// The transport failed. Always followed by [`TransportEvent::Closed`].
    Error(String),
    /// The socket is closed. Emitted exactly once, last.
    Closed { code: u16, reason: String },
}

/// Inbound callback registered when a transport is opened.
pub type InboundHandler = Box<dyn FnMut(&dyn Transport, TransportEvent) + Send>;

/// An open (or opening) socket.
pub trait Transport: Send + Sync {
    /// Sends one discrete JSON text frame.
    fn send(&self, frame: &serde_json::Value) -> Result<(), TransportError>;

    /// Starts a close handshake with the given status code and reason.
    fn close(&self, code: u16, reason: &str);
}

/// Opens transports.
pub trait Connector: Send + Sync {
    /// Opens a socket to `url`. Returns as soon as the request is accepted;
    /// connection progress arrives on `handler`.
    fn open(&self, url: &str, handler: InboundHandler) -> Result<Arc<dyn Transport>, TransportError>;
}

/// Serializes `msg` and sends it as one frame.
pub fn send_message<T: Serialize>(
    transport: &dyn Transport,
    msg: &T,
) -> Result<(), TransportError> {
    let frame = serde_json::to_value(msg)?;
    transport.send(&frame)
}
