//! In-memory transport and connector for driving sessions in tests.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::TransportError;
use crate::transport::{Connector, InboundHandler, Transport, TransportEvent};

/// Records every frame and close request.
#[derive(Default)]
pub(crate) struct RecordingTransport {
    sent: Mutex<Vec<Value>>,
    closes: Mutex<Vec<(u16, String)>>,
    fail_sends: Mutex<bool>,
}

impl RecordingTransport {
    pub(crate) fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn closes(&self) -> Vec<(u16, String)> {
        self.closes.lock().unwrap().clone()
    }

    pub(crate) fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock().unwrap() = fail;
    }
}

impl Transport for RecordingTransport {
    fn send(&self, frame: &Value) -> Result<(), TransportError> {
        if *self.fail_sends.lock().unwrap() {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) {
        self.closes.lock().unwrap().push((code, reason.to_string()));
    }
}

/// Connector whose socket is driven by the test through [`ScriptedConnector::deliver`].
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    transport: Arc<RecordingTransport>,
    handler: Mutex<Option<InboundHandler>>,
    urls: Mutex<Vec<String>>,
    refuse: Mutex<bool>,
}

impl ScriptedConnector {
    pub(crate) fn transport(&self) -> &RecordingTransport {
        &self.transport
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.handler.lock().unwrap().is_some()
    }

    /// Makes the next `open` fail.
    pub(crate) fn refuse_connections(&self) {
        *self.refuse.lock().unwrap() = true;
    }

    /// Feeds one event to the registered handler.
    pub(crate) fn deliver(&self, event: TransportEvent) {
        let mut slot = self.handler.lock().unwrap();
        let handler = slot.as_mut().expect("transport not opened");
        handler(self.transport.as_ref(), event);
    }

    pub(crate) fn deliver_json(&self, frame: Value) {
        self.deliver(TransportEvent::Message(frame.to_string()));
    }

    /// Runs the full challenge/response exchange up to `init`.
    pub(crate) fn complete_handshake(&self) {
        self.deliver(TransportEvent::Open);
        self.deliver_json(serde_json::json!({"type": "hmacChallenge", "challenge": "c-1"}));
        self.deliver_json(serde_json::json!({"type": "init"}));
    }
}

impl Connector for ScriptedConnector {
    fn open(&self, url: &str, handler: InboundHandler) -> Result<Arc<dyn Transport>, TransportError> {
        if *self.refuse.lock().unwrap() {
            return Err(TransportError::Closed);
        }
        self.urls.lock().unwrap().push(url.to_string());
        *self.handler.lock().unwrap() = Some(handler);
        Ok(self.transport.clone())
    }
}
