//! Canal push STOMP sobre WebSocket (`tokio-tungstenite`).
//!
//! Una conexión por suscripción: el servicio bajo prueba sólo ofrece tópicos
//! por recurso y así el cierre de una suscripción no afecta a las demás.
//! Secuencia: `CONNECT` -> `CONNECTED` -> `SUBSCRIBE` (con receipt) y luego
//! `MESSAGE`* hasta el cierre, que envía `UNSUBSCRIBE` y `DISCONNECT`.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use probe_core::constants::SUBSCRIPTION_BUFFER;
use probe_core::{ProbeError, PushChannel, PushSubscription};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::errors::AdapterError;
use crate::http::decode_body;
use crate::stomp::StompFrame;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Sink = SplitSink<Socket, Message>;
type Source = SplitStream<Socket>;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

/// Cuánto esperar el `RECEIPT` del `SUBSCRIBE` antes de seguir sin él.
pub const DEFAULT_RECEIPT_GRACE: Duration = Duration::from_millis(500);

pub struct StompPushChannel {
    url: String,
    host: String,
    connect_timeout: Duration,
    receipt_grace: Duration,
}

impl StompPushChannel {
    /// `url` es el endpoint WebSocket crudo (`ws://host:8080/ws/websocket`).
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, AdapterError> {
        let rest = url.strip_prefix("ws://")
                      .or_else(|| url.strip_prefix("wss://"))
                      .ok_or_else(|| AdapterError::InvalidUrl(url.to_string()))?;
        let host = rest.split('/').next().unwrap_or_default().to_string();
        if host.is_empty() {
            return Err(AdapterError::InvalidUrl(url.to_string()));
        }
        Ok(Self { url: url.to_string(),
                  host,
                  connect_timeout,
                  receipt_grace: DEFAULT_RECEIPT_GRACE })
    }

    pub fn with_receipt_grace(mut self, grace: Duration) -> Self {
        self.receipt_grace = grace;
        self
    }

    async fn connect(&self, token: Option<&str>) -> Result<(Sink, Source), AdapterError> {
        let (socket, _) = tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
            .await
            .map_err(|_| AdapterError::Timeout(format!("websocket connect to {}", self.url)))??;
        let (mut sink, mut source) = socket.split();

        let mut connect = StompFrame::new("CONNECT").header("accept-version", "1.2")
                                                    .header("host", self.host.as_str())
                                                    .header("heart-beat", "0,0");
        if let Some(token) = token {
            connect = connect.header("Authorization", format!("Bearer {token}"));
        }
        sink.send(Message::Text(connect.encode())).await?;

        tokio::time::timeout(self.connect_timeout, await_connected(&mut source)).await
                                                                                .map_err(|_| AdapterError::Timeout("STOMP CONNECT".into()))??;
        Ok((sink, source))
    }
}

#[async_trait]
impl PushChannel for StompPushChannel {
    async fn subscribe(&self, topic: &str, token: Option<&str>) -> Result<PushSubscription, ProbeError> {
        let (mut sink, source) = self.connect(token).await?;
        let n = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
        let id = format!("sub-{n}");
        let receipt = format!("rcpt-{n}");
        let subscribe = StompFrame::new("SUBSCRIBE").header("id", id.as_str())
                                                    .header("destination", topic)
                                                    .header("ack", "auto")
                                                    .header("receipt", receipt.as_str());
        sink.send(Message::Text(subscribe.encode())).await.map_err(AdapterError::from)?;

        let (events_tx, events_rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (receipt_tx, receipt_rx) = oneshot::channel::<()>();
        tokio::spawn(pump(sink, source, Pump { id, receipt, topic: topic.to_string() }, events_tx, stop_rx, receipt_tx));

        if tokio::time::timeout(self.receipt_grace, receipt_rx).await.is_err() {
            debug!("no RECEIPT for {topic}, continuing");
        }
        debug!("subscribed to {topic}");
        Ok(PushSubscription::new(topic, events_rx).with_on_close(move || {
                                                     let _ = stop_tx.send(());
                                                 }))
    }
}

async fn await_connected(source: &mut Source) -> Result<(), AdapterError> {
    while let Some(message) = source.next().await {
        let Message::Text(text) = message? else { continue };
        match StompFrame::decode(&text)? {
            Some(f) if f.command == "CONNECTED" => return Ok(()),
            Some(f) if f.command == "ERROR" => {
                let reason = f.get("message").unwrap_or(f.body.as_str()).to_string();
                return Err(AdapterError::Stomp(format!("connect rejected: {reason}")));
            }
            _ => continue,
        }
    }
    Err(AdapterError::Stomp("connection closed before CONNECTED".into()))
}

struct Pump {
    id: String,
    receipt: String,
    topic: String,
}

enum Wake {
    Stop,
    Frame(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
}

async fn pump(mut sink: Sink,
              mut source: Source,
              sub: Pump,
              events: mpsc::Sender<serde_json::Value>,
              mut stop: oneshot::Receiver<()>,
              receipt: oneshot::Sender<()>) {
    let mut receipt = Some(receipt);
    loop {
        let wake = tokio::select! {
            _ = &mut stop => Wake::Stop,
            message = source.next() => Wake::Frame(message),
        };
        let text = match wake {
            Wake::Stop => break,
            Wake::Frame(Some(Ok(Message::Text(text)))) => text,
            Wake::Frame(Some(Ok(Message::Close(_)))) | Wake::Frame(None) => {
                debug!("websocket for {} closed by server", sub.topic);
                return;
            }
            Wake::Frame(Some(Ok(_))) => continue,
            Wake::Frame(Some(Err(e))) => {
                warn!("websocket for {} failed: {e}", sub.topic);
                return;
            }
        };
        let frame = match StompFrame::decode(&text) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                warn!("{}: {e}", sub.topic);
                continue;
            }
        };
        match frame.command.as_str() {
            "MESSAGE" if frame.get("subscription") == Some(sub.id.as_str()) => {
                if events.send(decode_body(&frame.body)).await.is_err() {
                    break;
                }
            }
            "RECEIPT" if frame.get("receipt-id") == Some(sub.receipt.as_str()) => {
                if let Some(tx) = receipt.take() {
                    let _ = tx.send(());
                }
            }
            "ERROR" => {
                warn!("STOMP error on {}: {}", sub.topic, frame.get("message").unwrap_or(frame.body.as_str()));
                return;
            }
            _ => {}
        }
    }

    let unsubscribe = StompFrame::new("UNSUBSCRIBE").header("id", sub.id.as_str());
    let disconnect = StompFrame::new("DISCONNECT");
    for frame in [unsubscribe, disconnect] {
        if sink.send(Message::Text(frame.encode())).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
    debug!("unsubscribed {} from {}", sub.id, sub.topic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_is_taken_from_the_url() {
        let ch = StompPushChannel::new("ws://localhost:8080/ws/websocket", Duration::from_secs(1)).unwrap();
        assert_eq!(ch.host, "localhost:8080");
        assert!(StompPushChannel::new("http://localhost:8080/ws", Duration::from_secs(1)).is_err());
    }
}
