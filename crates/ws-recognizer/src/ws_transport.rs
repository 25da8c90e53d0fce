//! WebSocket transport adapter over tokio-tungstenite.
//!
//! `open` validates the URL and returns right away. Connecting, the write
//! pump and the read pump run on spawned tasks; frames sent before the
//! socket is up wait in the write channel.

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use inkwire_protocol::constants::WS_MAX_MESSAGE_SIZE;

use crate::TransportError;
use crate::transport::{Connector, InboundHandler, Transport, TransportEvent};

/// Close code reported when the peer closed without a status.
const CLOSE_NO_STATUS: u16 = 1005;

/// Close code reported when the connection dropped without a close frame.
const CLOSE_ABNORMAL: u16 = 1006;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens recognition sockets with tokio-tungstenite.
#[derive(Debug, Clone)]
pub struct WsConnector {
    max_message_size: usize,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self {
            max_message_size: WS_MAX_MESSAGE_SIZE,
        }
    }
}

impl WsConnector {
    /// Overrides the inbound message size limit.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }
}

impl Connector for WsConnector {
    fn open(&self, url: &str, handler: InboundHandler) -> Result<Arc<dyn Transport>, TransportError> {
        let request = url.into_client_request()?;

        let mut ws_config = WebSocketConfig::default();
        ws_config.max_message_size = Some(self.max_message_size);
        ws_config.max_frame_size = Some(self.max_message_size);

        let (write_tx, write_rx) = mpsc::unbounded_channel::<Message>();
        let transport = Arc::new(WsTransport { write_tx });

        tokio::spawn(run_connection(
            request,
            ws_config,
            transport.clone(),
            write_rx,
            handler,
        ));

        Ok(transport)
    }
}

/// Sending half of one socket.
struct WsTransport {
    write_tx: mpsc::UnboundedSender<Message>,
}

impl Transport for WsTransport {
    fn send(&self, frame: &Value) -> Result<(), TransportError> {
        let json = serde_json::to_string(frame)?;
        trace!(len = json.len(), "queueing frame");
        self.write_tx
            .send(Message::Text(json.into()))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        if self.write_tx.send(Message::Close(Some(frame))).is_err() {
            debug!("close requested on a finished socket");
        }
    }
}

async fn run_connection(
    request: Request,
    ws_config: WebSocketConfig,
    link: Arc<WsTransport>,
    write_rx: mpsc::UnboundedReceiver<Message>,
    mut handler: InboundHandler,
) {
    let uri = request.uri().clone();
    let ws_stream =
        match tokio_tungstenite::connect_async_with_config(request, Some(ws_config), false).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                warn!(%uri, error = %e, "websocket connect failed");
                handler(link.as_ref(), TransportEvent::Error(e.to_string()));
                handler(
                    link.as_ref(),
                    TransportEvent::Closed {
                        code: CLOSE_ABNORMAL,
                        reason: String::new(),
                    },
                );
                return;
            }
        };
    debug!(%uri, "websocket connected");
    handler(link.as_ref(), TransportEvent::Open);

    let (write, read) = ws_stream.split();
    let cancel = CancellationToken::new();
    let write_handle = tokio::spawn(write_pump(write, write_rx, cancel.clone()));

    let (code, reason) = read_pump(read, link.as_ref(), &mut handler).await;
    cancel.cancel();
    let _ = write_handle.await;

    handler(link.as_ref(), TransportEvent::Closed { code, reason });
}

/// Forwards queued frames to the socket until a close frame has been sent
/// or the connection ends.
async fn write_pump(
    mut write: SplitSink<WsStream, Message>,
    mut write_rx: mpsc::UnboundedReceiver<Message>,
    cancel: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => match msg {
                Some(msg) => msg,
                None => break,
            },
        };
        let is_close = matches!(msg, Message::Close(_));
        if let Err(e) = write.send(msg).await {
            warn!(error = %e, "websocket write failed");
            break;
        }
        if is_close {
            break;
        }
    }
}

/// Delivers inbound text frames until the socket closes. Returns the close
/// status.
async fn read_pump(
    mut read: SplitStream<WsStream>,
    link: &dyn Transport,
    handler: &mut InboundHandler,
) -> (u16, String) {
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                handler(link, TransportEvent::Message(text.as_str().to_owned()));
            }
            Some(Ok(Message::Close(frame))) => {
                return frame
                    .map(|f| (u16::from(f.code), f.reason.as_str().to_owned()))
                    .unwrap_or((CLOSE_NO_STATUS, String::new()));
            }
            Some(Ok(Message::Binary(data))) => {
                debug!(len = data.len(), "ignoring binary frame");
            }
            Some(Ok(_)) => {}
            Some(Err(tungstenite::Error::ConnectionClosed)) | None => {
                return (CLOSE_ABNORMAL, String::new());
            }
            Some(Err(e)) => {
                handler(link, TransportEvent::Error(e.to_string()));
                return (CLOSE_ABNORMAL, String::new());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use tokio::net::TcpListener;

    use inkwire_protocol::auth::compute_hmac;
    use inkwire_protocol::constants::MATH_WS_SUFFIX;
    use inkwire_protocol::{Stroke, frames};

    use crate::config::{RecognitionConfig, ServerConfig};
    use crate::recognizer::WsRecognizer;
    use crate::session::SessionState;
    use crate::stroke_source::InkModel;

    type ServerSocket = WebSocketStream<TcpStream>;

    async fn next_json(ws: &mut ServerSocket) -> Value {
        loop {
            match ws.next().await.expect("stream ended").expect("read failed") {
                Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
                _ => continue,
            }
        }
    }

    async fn send_json(ws: &mut ServerSocket, value: Value) {
        ws.send(Message::Text(value.to_string().into())).await.unwrap();
    }

    /// Minimal recognition server: HMAC handshake, then one numbered result
    /// per start/continue frame. Returns the frames it received and the
    /// client's close status.
    async fn fake_server(listener: TcpListener) -> (Vec<Value>, Option<(u16, String)>) {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        let hello = next_json(&mut ws).await;
        assert_eq!(hello["type"], "applicationKey");
        assert_eq!(hello["applicationKey"], "app");

        send_json(&mut ws, json!({"type": "hmacChallenge", "challenge": "srv-1"})).await;
        let answer = next_json(&mut ws).await;
        assert_eq!(answer["type"], "hmac");
        assert_eq!(answer["hmac"], compute_hmac("srv-1", "app", "secret"));
        send_json(&mut ws, json!({"type": "init"})).await;

        let mut received = Vec::new();
        let mut close = None;
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    let frame: Value = serde_json::from_str(text.as_str()).unwrap();
                    if frame["type"] == "reset" {
                        send_json(&mut ws, json!({"type": "reset"})).await;
                        continue;
                    }
                    let seq = received.len();
                    received.push(frame);
                    send_json(&mut ws, json!({"type": "mathResult", "seq": seq})).await;
                }
                Ok(Message::Close(frame)) => {
                    close = frame.map(|f| (u16::from(f.code), f.reason.as_str().to_owned()));
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        (received, close)
    }

    fn stroke(x: f64) -> Stroke {
        let mut s = Stroke::new();
        s.push(x, 0.0, 0);
        s.push(x, 10.0, 30);
        s
    }

    fn local_config(port: u16) -> RecognitionConfig {
        RecognitionConfig {
            server: ServerConfig {
                scheme: "http".into(),
                host: format!("127.0.0.1:{port}"),
                application_key: "app".into(),
                hmac_key: "secret".into(),
            },
            ..RecognitionConfig::default()
        }
    }

    #[tokio::test]
    async fn end_to_end_session_over_websocket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(fake_server(listener));

        let config = local_config(port);
        let recognizer = WsRecognizer::new();
        let mut session = SessionState::new();
        let handshake = recognizer.initialize(MATH_WS_SUFFIX, &config, &mut session);

        let model = Arc::new(InkModel::new());
        model.add_stroke(stroke(1.0));
        let first = recognizer
            .recognize(
                &config,
                &session,
                model.clone(),
                Box::new(|c, s| frames::math_start(&c.math, s)),
                Box::new(frames::math_continue),
                Box::new(|_| {}),
            )
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), handshake)
            .await
            .expect("handshake timed out")
            .unwrap();
        let first = tokio::time::timeout(Duration::from_secs(5), first)
            .await
            .expect("first result timed out")
            .unwrap();
        assert_eq!(first["seq"], 0);

        model.add_stroke(stroke(2.0));
        let second = recognizer
            .recognize(
                &config,
                &session,
                model.clone(),
                Box::new(|c, s| frames::math_start(&c.math, s)),
                Box::new(frames::math_continue),
                Box::new(|_| {}),
            )
            .unwrap();
        let second = tokio::time::timeout(Duration::from_secs(5), second)
            .await
            .expect("second result timed out")
            .unwrap();
        assert_eq!(second["seq"], 1);

        recognizer.reset(&session).unwrap();
        recognizer.close(&mut session);

        let (received, close) = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("server did not finish")
            .unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0]["type"], "start");
        assert_eq!(received[0]["components"].as_array().unwrap().len(), 1);
        assert_eq!(received[1]["type"], "continue");
        assert_eq!(received[1]["components"][0]["x"], json!([2.0, 2.0]));
        assert_eq!(close, Some((1000, "CLEAR".to_string())));
    }

    #[tokio::test]
    async fn dropped_session_closes_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(fake_server(listener));

        let config = local_config(port);
        let recognizer = WsRecognizer::new();
        let mut session = SessionState::new();
        let handshake = recognizer.initialize(MATH_WS_SUFFIX, &config, &mut session);
        tokio::time::timeout(Duration::from_secs(5), handshake)
            .await
            .expect("handshake timed out")
            .unwrap();

        drop(session);
        drop(recognizer);

        let (received, close) = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("connection outlived its session")
            .unwrap();
        assert!(received.is_empty());
        assert_eq!(close, Some((1000, "CLEAR".to_string())));
    }

    #[tokio::test]
    async fn refused_connection_rejects_handshake() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = local_config(port);
        let recognizer = WsRecognizer::new();
        let mut session = SessionState::new();
        let handshake = recognizer.initialize(MATH_WS_SUFFIX, &config, &mut session);

        let outcome = tokio::time::timeout(Duration::from_secs(5), handshake)
            .await
            .expect("handshake did not settle");
        assert!(matches!(outcome, Err(crate::RecognizerError::Transport(_))));
    }

    #[tokio::test]
    async fn invalid_url_fails_to_open() {
        let result = WsConnector::default().open("not a url", Box::new(|_, _| {}));
        assert!(result.is_err());
    }

    #[test]
    fn message_size_override() {
        let connector = WsConnector::default().with_max_message_size(1024);
        assert_eq!(connector.max_message_size, 1024);
        assert_eq!(WsConnector::default().max_message_size, WS_MAX_MESSAGE_SIZE);
    }
}
