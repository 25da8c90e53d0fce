//! Session sequencer.
//!
//! Owns the order of operations on a [`SessionState`]: open and handshake
//! once, admit `recognize` calls strictly in call order, and send the first
//! admitted request as a start frame and every later one as a continue
//! frame.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::Shared;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use inkwire_protocol::ResetMessage;
use inkwire_protocol::Stroke;
use inkwire_protocol::constants::{WS_CLOSE_NORMAL, WS_CLOSE_REASON_CLEAR};

use crate::RecognizerError;
use crate::config::RecognitionConfig;
use crate::deferred::{Deferred, deferred};
use crate::dispatcher::ResponseDispatcher;
use crate::session::{
    PendingRequest, RequestContext, SessionState, SharedQueue, lock_queue, reject_pending,
};
use crate::stroke_source::StrokeSource;
use crate::transport::{Connector, Transport, send_message};
use crate::ws_transport::WsConnector;

/// Builds the first frame of a session from the configuration and strokes.
pub type BuildStart = Box<dyn FnOnce(&RecognitionConfig, &[Stroke]) -> Value + Send>;

/// Builds every later frame from the new strokes.
pub type BuildContinue = Box<dyn FnOnce(&[Stroke]) -> Value + Send>;

/// Observes a request's outcome just before its future settles.
pub type OnResult = Box<dyn FnOnce(&Result<Value, RecognizerError>) + Send>;

/// Result of one `recognize` call.
pub type ResultFuture = Deferred<Value>;

/// Handshake completion, observable by any number of waiters.
pub type HandshakeFuture = Shared<Deferred<()>>;

/// Drives recognition sessions over connections opened by `C`.
pub struct WsRecognizer<C = WsConnector> {
    connector: C,
}

impl WsRecognizer<WsConnector> {
    pub fn new() -> Self {
        Self::with_connector(WsConnector::default())
    }
}

impl Default for WsRecognizer<WsConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> WsRecognizer<C> {
    pub fn with_connector(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Opens the session's connection and starts the handshake.
    ///
    /// Returns the handshake future, which is also stored on the session.
    /// It resolves once the server sends `init` and rejects if the
    /// handshake fails; failure is terminal for the session. Requests
    /// queued on a failed session stay pending until [`close`](Self::close).
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(
        &self,
        suffix: &str,
        config: &RecognitionConfig,
        session: &mut SessionState,
    ) -> HandshakeFuture {
        if session.connection.is_some() {
            warn!("session already connected, closing previous connection");
            self.close(session);
        }

        let url = config.server.websocket_url(suffix);
        session.queue = SharedQueue::default();
        session.closed = false;

        let (settler, handshake) = deferred::<()>();
        let dispatcher = ResponseDispatcher::new(session.queue.clone(), config.server.clone(), settler);

        info!(%url, "opening recognition socket");
        let handshake = match self.connector.open(&url, dispatcher.into_handler()) {
            Ok(transport) => {
                session.connection = Some(transport);
                handshake.shared()
            }
            Err(e) => {
                error!(%url, error = %e, "failed to open recognition socket");
                Deferred::rejected(e.into()).shared()
            }
        };
        session.handshake = Some(handshake.clone());

        let (admission_tx, admission_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        session.admission_cancel.cancel();
        session.admission_cancel = cancel.clone();
        session.admission = Some(admission_tx);

        tokio::spawn(admission_loop(
            admission_rx,
            handshake.clone(),
            session.queue.clone(),
            session.connection.clone(),
            cancel,
        ));

        handshake
    }

    /// Queues one recognition request and returns its result future
    /// without waiting.
    ///
    /// Once the handshake succeeds the request takes the strokes pending on
    /// `model` and is sent as a start frame (first request of the session)
    /// or a continue frame (every other request), in call order. The future
    /// settles when the matching response arrives.
    pub fn recognize(
        &self,
        config: &RecognitionConfig,
        session: &SessionState,
        model: Arc<dyn StrokeSource>,
        build_start: BuildStart,
        build_continue: BuildContinue,
        on_result: OnResult,
    ) -> Result<ResultFuture, RecognizerError> {
        if session.closed {
            return Err(RecognizerError::Closed);
        }
        let admission = session
            .admission
            .as_ref()
            .ok_or(RecognizerError::NotInitialized)?;

        let (settler, result) = deferred();
        let ctx = RequestContext {
            config: config.clone(),
            model,
            build_start,
            build_continue,
            on_result,
            settler,
        };
        admission.send(ctx).map_err(|_| RecognizerError::Closed)?;
        Ok(result)
    }

    /// Asks the server to drop its recognition context. No-op without a
    /// connection.
    pub fn reset(&self, session: &SessionState) -> Result<(), RecognizerError> {
        let Some(connection) = &session.connection else {
            debug!("no connection, nothing to reset");
            return Ok(());
        };
        debug!("sending reset");
        send_message(connection.as_ref(), &ResetMessage::default())?;
        Ok(())
    }

    /// Closes the session's connection. No-op without a connection.
    ///
    /// Requests still awaiting admission or a response are rejected with
    /// [`RecognizerError::Closed`].
    pub fn close(&self, session: &mut SessionState) {
        session.admission = None;
        session.admission_cancel.cancel();

        let Some(connection) = session.connection.take() else {
            debug!("no connection to close");
            return;
        };

        connection.close(WS_CLOSE_NORMAL, WS_CLOSE_REASON_CLEAR);
        session.closed = true;
        let rejected = reject_pending(&session.queue, RecognizerError::Closed);
        info!(rejected, "recognition session closed");
    }
}

/// Admits queued requests in order once the handshake has succeeded.
async fn admission_loop(
    mut rx: mpsc::UnboundedReceiver<RequestContext>,
    handshake: HandshakeFuture,
    queue: SharedQueue,
    transport: Option<Arc<dyn Transport>>,
    cancel: CancellationToken,
) {
    let ready = tokio::select! {
        _ = cancel.cancelled() => {
            reject_queued(&mut rx);
            return;
        }
        ready = handshake => ready,
    };

    let transport = match (ready, transport) {
        (Ok(()), Some(transport)) => transport,
        (Ok(()), None) => {
            reject_queued(&mut rx);
            return;
        }
        (Err(e), _) => {
            error!(error = %e, "fatal error while initializing recognizer");
            // Queued requests are not failed by the handshake; they wait for close.
            cancel.cancelled().await;
            reject_queued(&mut rx);
            return;
        }
    };
    debug!("handshake done, feeding the recognition queue");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(ctx) => send_request(&queue, transport.as_ref(), ctx),
                None => break,
            },
        }
    }
    reject_queued(&mut rx);
}

/// The send step: read pending strokes, frame, send, and enqueue for
/// response matching. Sending and enqueueing happen under the queue lock so
/// a response can never be matched before its request is queued. The frame
/// builders run outside the lock; this task is the only writer of
/// `send_sequence`, so the value read before building still holds.
///
/// Strokes are committed on the model only once the transport accepted the
/// frame, so a failed send leaves them for the next request.
fn send_request(queue: &SharedQueue, transport: &dyn Transport, ctx: RequestContext) {
    let RequestContext {
        config,
        model,
        build_start,
        build_continue,
        on_result,
        settler,
    } = ctx;
    let strokes = model.pending_strokes();

    let first = lock_queue(queue).send_sequence == 0;
    let frame = if first {
        build_start(&config, &strokes)
    } else {
        build_continue(&strokes)
    };

    let request = PendingRequest { on_result, settler };
    let mut guard = lock_queue(queue);
    match transport.send(&frame) {
        Ok(()) => {
            model.commit_sent(strokes.len());
            if first {
                guard.send_sequence = 1;
            }
            guard.pending.push_back(request);
            debug!(
                start = first,
                strokes = strokes.len(),
                pending = guard.pending.len(),
                "recognition frame sent"
            );
        }
        Err(e) => {
            drop(guard);
            warn!(
                error = %e,
                strokes = strokes.len(),
                "failed to send recognition frame, strokes kept pending"
            );
            request.settle(Err(e.into()));
        }
    }
}

fn reject_queued(rx: &mut mpsc::UnboundedReceiver<RequestContext>) {
    rx.close();
    while let Ok(ctx) = rx.try_recv() {
        ctx.into_pending().settle(Err(RecognizerError::Closed));
    }
}
