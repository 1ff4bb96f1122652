//! Minimal DevTools protocol session over a WebSocket.
//!
//! Commands carry increasing ids; a background task routes each response to
//! the waiting caller and forwards every event to an unbounded channel.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::error::BrowserError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<CdpReply>>>>;

#[derive(Debug, Clone, PartialEq)]
pub struct CdpEvent {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CdpReply {
    pub id: u64,
    pub result: Result<Value, (i64, String)>,
}

pub struct CdpSession {
    next_id: AtomicU64,
    pending: Pending,
    writer: Mutex<WsSink>,
    events: mpsc::UnboundedReceiver<CdpEvent>,
    command_timeout: Duration,
    reader: tokio::task::JoinHandle<()>,
}

impl CdpSession {
    pub async fn connect(ws_url: &str, command_timeout: Duration) -> Result<Self, BrowserError> {
        tracing::debug!("Connecting to DevTools page at {}", ws_url);

        let (stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| BrowserError::ConnectionFailed {
                url: ws_url.to_string(),
                reason: e.to_string(),
            })?;
        let (writer, reader) = stream.split();

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, events) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_loop(reader, Arc::clone(&pending), event_tx));

        Ok(Self {
            next_id: AtomicU64::new(1),
            pending,
            writer: Mutex::new(writer),
            events,
            command_timeout,
            reader,
        })
    }

    pub async fn send(&self, method: &str, params: Value) -> Result<Value, BrowserError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let message = build_cdp_message(id, method, params);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let sent = self
            .writer
            .lock()
            .await
            .send(Message::Text(message.to_string()))
            .await;
        if let Err(e) = sent {
            self.pending.lock().await.remove(&id);
            return Err(BrowserError::Protocol {
                detail: format!("failed to send {method}: {e}"),
            });
        }

        let reply = match tokio::time::timeout(self.command_timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => {
                return Err(BrowserError::Protocol {
                    detail: "connection closed before reply".to_string(),
                })
            }
            Err(_) => {
                // 逾時後回應不會再被讀取
                self.pending.lock().await.remove(&id);
                return Err(BrowserError::Timeout {
                    method: method.to_string(),
                    duration: self.command_timeout,
                });
            }
        };

        reply
            .result
            .map_err(|(code, message)| BrowserError::Cdp { code, message })
    }

    /// Wait for an event named `method`, dropping any other event on the way.
    pub async fn wait_for_event(&mut self, method: &str, timeout: Duration) -> Result<CdpEvent, BrowserError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.events.recv()).await {
                Ok(Some(event)) if event.method == method => return Ok(event),
                Ok(Some(_)) => continue,
                Ok(None) => {
                    return Err(BrowserError::Protocol {
                        detail: format!("connection closed while waiting for {method}"),
                    })
                }
                Err(_) => return Err(BrowserError::PageLoadTimeout { duration: timeout }),
            }
        }
    }

    /// Discard events queued so far, so a later wait only sees fresh ones.
    pub fn drain_events(&mut self) {
        while self.events.try_recv().is_ok() {}
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    mut reader: futures_util::stream::SplitStream<WsStream>,
    pending: Pending,
    events: mpsc::UnboundedSender<CdpEvent>,
) {
    while let Some(frame) = reader.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("DevTools socket error: {}", e);
                break;
            }
        };
        let Ok(json) = serde_json::from_str::<Value>(&text) else {
            continue;
        };

        if let Some(reply) = parse_cdp_reply(&json) {
            if let Some(tx) = pending.lock().await.remove(&reply.id) {
                let _ = tx.send(reply);
            }
        } else if let Some(event) = parse_cdp_event(&json) {
            if events.send(event).is_err() {
                break;
            }
        }
    }
    // Dropping the senders wakes every caller still waiting.
    pending.lock().await.clear();
}

pub fn build_cdp_message(id: u64, method: &str, params: Value) -> Value {
    json!({ "id": id, "method": method, "params": params })
}

pub fn parse_cdp_reply(json: &Value) -> Option<CdpReply> {
    let id = json.get("id")?.as_u64()?;
    let result = match json.get("error") {
        Some(error) => Err((
            error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        )),
        None => Ok(json.get("result").cloned().unwrap_or(Value::Null)),
    };
    Some(CdpReply { id, result })
}

pub fn parse_cdp_event(json: &Value) -> Option<CdpEvent> {
    if json.get("id").is_some() {
        return None;
    }
    Some(CdpEvent {
        method: json.get("method")?.as_str()?.to_string(),
        params: json.get("params").cloned().unwrap_or(Value::Null),
    })
}

/// Extract the value of a `Runtime.evaluate` result, surfacing page exceptions.
pub fn evaluation_value(result: &Value) -> Result<Value, BrowserError> {
    if let Some(details) = result.get("exceptionDetails") {
        let message = details
            .pointer("/exception/description")
            .or_else(|| details.get("text"))
            .and_then(Value::as_str)
            .unwrap_or("unknown exception")
            .to_string();
        return Err(BrowserError::JsException { message });
    }
    Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
}
