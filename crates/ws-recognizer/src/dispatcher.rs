//! Inbound frame handling for one session.
//!
//! Until the server sends `init`, frames are handshake traffic: the
//! dispatcher answers the HMAC challenge and settles the handshake future.
//! Afterwards every frame (except reset acknowledgements) is the response to
//! the oldest pending request. No request identifiers exist on the wire, so
//! matching relies on the server answering in send order.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use inkwire_protocol::{
    ApplicationKeyMessage, FrameError, FrameType, HmacChallenge, HmacMessage, InboundFrame,
};

use crate::RecognizerError;
use crate::config::ServerConfig;
use crate::deferred::Settler;
use crate::session::{SharedQueue, lock_queue, reject_pending};
use crate::transport::{InboundHandler, Transport, TransportEvent, send_message};

pub(crate) struct ResponseDispatcher {
    queue: SharedQueue,
    server: ServerConfig,
    /// Held until the handshake settles; `None` means recognition phase.
    handshake: Option<Settler<()>>,
}

impl ResponseDispatcher {
    pub(crate) fn new(queue: SharedQueue, server: ServerConfig, handshake: Settler<()>) -> Self {
        Self {
            queue,
            server,
            handshake: Some(handshake),
        }
    }

    pub(crate) fn into_handler(mut self) -> InboundHandler {
        Box::new(move |link, event| self.handle(link, event))
    }

    pub(crate) fn handle(&mut self, link: &dyn Transport, event: TransportEvent) {
        match event {
            TransportEvent::Open => self.on_open(link),
            TransportEvent::Message(text) => {
                let frame = InboundFrame::parse(&text);
                if self.handshake.is_some() {
                    self.on_handshake_frame(link, frame);
                } else {
                    self.on_result_frame(frame);
                }
            }
            TransportEvent::Error(reason) => {
                if self.handshake.is_some() {
                    self.fail_handshake(RecognizerError::Transport(reason));
                } else {
                    warn!(%reason, "recognition socket error");
                }
            }
            TransportEvent::Closed { code, reason } => self.on_closed(code, &reason),
        }
    }

    fn on_open(&mut self, link: &dyn Transport) {
        if self.handshake.is_none() {
            return;
        }
        debug!("socket open, sending application key");
        let msg = ApplicationKeyMessage::new(&self.server.application_key);
        if let Err(e) = send_message(link, &msg) {
            self.fail_handshake(e.into());
        }
    }

    fn on_handshake_frame(&mut self, link: &dyn Transport, frame: Result<InboundFrame, FrameError>) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "ignoring malformed frame during handshake");
                return;
            }
        };

        match frame.frame_type {
            FrameType::HmacChallenge => {
                let challenge = match frame.parse_body::<HmacChallenge>() {
                    Ok(c) => c,
                    Err(e) => {
                        self.fail_handshake(RecognizerError::Handshake(format!(
                            "invalid challenge: {e}"
                        )));
                        return;
                    }
                };
                debug!("answering hmac challenge");
                let answer = HmacMessage::answer(
                    &challenge,
                    &self.server.application_key,
                    &self.server.hmac_key,
                );
                if let Err(e) = send_message(link, &answer) {
                    self.fail_handshake(e.into());
                }
            }
            FrameType::Init => {
                if let Some(settler) = self.handshake.take() {
                    info!(host = %self.server.host, "recognition session ready");
                    settler.resolve(());
                }
            }
            FrameType::Error => {
                let details = frame.server_error().unwrap_or_default();
                self.fail_handshake(RecognizerError::Handshake(details.describe()));
            }
            other => {
                warn!(
                    frame_type = other.as_str(),
                    "ignoring frame received before handshake completed"
                );
            }
        }
    }

    fn on_result_frame(&mut self, frame: Result<InboundFrame, FrameError>) {
        if matches!(&frame, Ok(f) if f.frame_type == FrameType::Reset) {
            debug!("server acknowledged reset");
            return;
        }

        let Some(request) = lock_queue(&self.queue).pending.pop_front() else {
            warn!("dropping response frame with no pending request");
            return;
        };

        let outcome: Result<Value, RecognizerError> = match frame {
            Ok(frame) => match frame.server_error() {
                Some(details) => Err(RecognizerError::Server {
                    code: details.code_text(),
                    message: details.describe(),
                }),
                None => Ok(frame.into_body()),
            },
            // Still consumes the oldest request so later responses stay aligned.
            Err(e) => Err(RecognizerError::Protocol(e.to_string())),
        };

        debug!(ok = outcome.is_ok(), "settling oldest pending request");
        request.settle(outcome);
    }

    fn on_closed(&mut self, code: u16, reason: &str) {
        if self.handshake.is_some() {
            self.fail_handshake(RecognizerError::Handshake(format!(
                "connection closed ({code}) {reason}"
            )));
        }
        let rejected = reject_pending(&self.queue, RecognizerError::Closed);
        info!(code, %reason, rejected, "recognition socket closed");
    }

    fn fail_handshake(&mut self, err: RecognizerError) {
        if let Some(settler) = self.handshake.take() {
            error!(error = %err, "recognition handshake failed");
            settler.reject(err);
        }
    }
}
