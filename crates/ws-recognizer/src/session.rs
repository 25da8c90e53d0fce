//! Per-surface session state.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use inkwire_protocol::constants::{WS_CLOSE_NORMAL, WS_CLOSE_REASON_CLEAR};

use crate::RecognizerError;
use crate::config::RecognitionConfig;
use crate::deferred::Settler;
use crate::recognizer::{BuildContinue, BuildStart, HandshakeFuture, OnResult};
use crate::stroke_source::StrokeSource;
use crate::transport::Transport;

/// A request that has been sent and awaits its response.
pub(crate) struct PendingRequest {
    pub(crate) on_result: OnResult,
    pub(crate) settler: Settler<Value>,
}

impl PendingRequest {
    /// Runs the result callback, then settles the caller's future.
    pub(crate) fn settle(self, outcome: Result<Value, RecognizerError>) {
        (self.on_result)(&outcome);
        self.settler.settle(outcome);
    }
}

/// A `recognize` call waiting for admission (handshake, then send).
pub(crate) struct RequestContext {
    pub(crate) config: RecognitionConfig,
    pub(crate) model: Arc<dyn StrokeSource>,
    pub(crate) build_start: BuildStart,
    pub(crate) build_continue: BuildContinue,
    pub(crate) on_result: OnResult,
    pub(crate) settler: Settler<Value>,
}

impl RequestContext {
    pub(crate) fn into_pending(self) -> PendingRequest {
        PendingRequest {
            on_result: self.on_result,
            settler: self.settler,
        }
    }
}

/// Mutable protocol state shared by the sequencer and the dispatcher.
#[derive(Default)]
pub(crate) struct RequestQueue {
    /// 0 until the start frame has been sent, 1 afterwards.
    pub(crate) send_sequence: u32,
    /// Sent requests, oldest first. Responses are matched against the front.
    pub(crate) pending: VecDeque<PendingRequest>,
}

pub(crate) type SharedQueue = Arc<Mutex<RequestQueue>>;

pub(crate) fn lock_queue(queue: &Mutex<RequestQueue>) -> MutexGuard<'_, RequestQueue> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Rejects every sent request still awaiting a response. Callbacks run
/// after the lock is released.
pub(crate) fn reject_pending(queue: &Mutex<RequestQueue>, err: RecognizerError) -> usize {
    let drained: Vec<PendingRequest> = lock_queue(queue).pending.drain(..).collect();
    let count = drained.len();
    for request in drained {
        request.settle(Err(err.clone()));
    }
    count
}

/// Recognition session of one drawing surface.
///
/// Created empty; [`WsRecognizer::initialize`](crate::WsRecognizer::initialize)
/// opens its connection and [`WsRecognizer::close`](crate::WsRecognizer::close)
/// releases it. The connection is never reopened implicitly.
pub struct SessionState {
    pub(crate) connection: Option<Arc<dyn Transport>>,
    pub(crate) handshake: Option<HandshakeFuture>,
    pub(crate) queue: SharedQueue,
    pub(crate) admission: Option<mpsc::UnboundedSender<RequestContext>>,
    pub(crate) admission_cancel: CancellationToken,
    pub(crate) closed: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            connection: None,
            handshake: None,
            queue: SharedQueue::default(),
            admission: None,
            admission_cancel: CancellationToken::new(),
            closed: false,
        }
    }

    /// Returns `true` while the session holds a connection.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Returns `true` once the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The handshake future stored by the last `initialize`.
    pub fn handshake(&self) -> Option<HandshakeFuture> {
        self.handshake.clone()
    }

    pub fn send_sequence(&self) -> u32 {
        lock_queue(&self.queue).send_sequence
    }

    /// Number of sent requests still awaiting a response.
    pub fn pending_requests(&self) -> usize {
        lock_queue(&self.queue).pending.len()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        self.admission_cancel.cancel();
        // The connection task owns its own handle to the socket, so it has
        // to be told to shut down.
        if let Some(connection) = self.connection.take() {
            debug!("session dropped while connected, closing socket");
            connection.close(WS_CLOSE_NORMAL, WS_CLOSE_REASON_CLEAR);
        }
    }
}
