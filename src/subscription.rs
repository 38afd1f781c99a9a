//! GraphQL over WebSocket subscriptions (graphql-transport-ws)
//!
//! [`SubscriptionClient`] dials the subscription endpoint lazily, performs
//! the `connection_init`/`connection_ack` handshake, starts the operation
//! with a `subscribe` frame, and forwards `next` payloads to the returned
//! stream. On abnormal connection loss the driver re-dials with capped
//! exponential backoff, re-sends `connection_init` (the params provider is
//! invoked again) and re-subscribes. Dropping the stream stops the driver
//! at the next event or reconnect attempt.

use crate::error::{Error, Result};
use crate::link::{Link, ResponseStream};
use crate::types::{GraphQLResponse, Operation};
use futures::{SinkExt, StreamExt};
use http::header::SEC_WEBSOCKET_PROTOCOL;
use http::HeaderValue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Provider of the `connection_init` payload, invoked on every (re)connect
pub type ConnectionParams = Arc<dyn Fn() -> serde_json::Value + Send + Sync>;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// graphql-transport-ws frame
#[derive(Debug, Serialize, Deserialize)]
struct WsFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    payload: Option<serde_json::Value>,
}

impl WsFrame {
    fn connection_init(payload: Option<serde_json::Value>) -> Self {
        Self {
            kind: "connection_init".to_string(),
            id: None,
            payload,
        }
    }

    fn subscribe(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: "subscribe".to_string(),
            id: Some(id.into()),
            payload: Some(payload),
        }
    }

    fn pong() -> Self {
        Self {
            kind: "pong".to_string(),
            id: None,
            payload: None,
        }
    }
}

/// WebSocket subscription client
pub struct SubscriptionClient {
    url: String,
    connection_params: Option<ConnectionParams>,
    reconnect: bool,
    ack_timeout: Duration,
    max_backoff: Duration,
}

impl SubscriptionClient {
    /// Create a client for a subscription endpoint
    ///
    /// Reconnect is enabled by default; no connection is opened until the
    /// first [`subscribe`](Self::subscribe) call.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection_params: None,
            reconnect: true,
            ack_timeout: Duration::from_secs(10),
            max_backoff: Duration::from_secs(30),
        }
    }

    /// Set the `connection_init` payload provider
    pub fn connection_params(
        mut self,
        params: impl Fn() -> serde_json::Value + Send + Sync + 'static,
    ) -> Self {
        self.connection_params = Some(Arc::new(params));
        self
    }

    /// Toggle automatic reconnect
    pub fn reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Time to wait for `connection_ack`
    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Upper bound on the reconnect backoff delay
    pub fn max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    /// The subscription endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Start a subscription, returning its event stream
    ///
    /// Spawns a driver task that owns the connection; dial errors and
    /// protocol failures arrive on the stream, not here.
    pub async fn subscribe(&self, operation: Operation) -> Result<ResponseStream> {
        let (tx, rx) = mpsc::channel(16);
        let driver = Driver {
            url: self.url.clone(),
            params: self.connection_params.clone(),
            reconnect: self.reconnect,
            ack_timeout: self.ack_timeout,
            max_backoff: self.max_backoff,
            operation,
            tx,
        };
        tokio::spawn(driver.run());
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

impl std::fmt::Debug for SubscriptionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionClient")
            .field("url", &self.url)
            .field("reconnect", &self.reconnect)
            .finish_non_exhaustive()
    }
}

/// How a connection session ended
enum SessionEnd {
    /// The operation finished; do not reconnect
    Completed,
    /// The connection was lost before `complete`
    Lost(Error),
}

/// Owns one subscription's connection across reconnects
struct Driver {
    url: String,
    params: Option<ConnectionParams>,
    reconnect: bool,
    ack_timeout: Duration,
    max_backoff: Duration,
    operation: Operation,
    tx: mpsc::Sender<Result<GraphQLResponse>>,
}

impl Driver {
    async fn run(self) {
        let mut attempt: u32 = 0;
        loop {
            let end = match self.serve(&mut attempt).await {
                Ok(SessionEnd::Completed) => break,
                Ok(SessionEnd::Lost(err)) | Err(err) => err,
            };

            if !self.reconnect || self.tx.is_closed() {
                let _ = self.tx.send(Err(end)).await;
                break;
            }

            attempt += 1;
            let delay = backoff(attempt, self.max_backoff);
            tracing::warn!(
                url = %self.url,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %end,
                "subscription connection lost, reconnecting"
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Run one connection session until the operation completes or the
    /// connection drops. Resets the backoff counter once a session is
    /// established.
    async fn serve(&self, attempt: &mut u32) -> Result<SessionEnd> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::WebSocket(e.to_string()))?;
        request.headers_mut().insert(
            SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static("graphql-transport-ws"),
        );

        let (mut stream, _) = connect_async(request)
            .await
            .map_err(|e| Error::WebSocket(e.to_string()))?;

        let payload = self.params.as_ref().map(|p| p());
        send_frame(&mut stream, &WsFrame::connection_init(payload)).await?;
        self.await_ack(&mut stream).await?;
        *attempt = 0;

        let payload = serde_json::to_value(&self.operation)?;
        send_frame(&mut stream, &WsFrame::subscribe("1", payload)).await?;
        tracing::debug!(url = %self.url, "subscription established");

        loop {
            let message = match stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Ok(SessionEnd::Lost(Error::WebSocket(e.to_string()))),
                None => {
                    return Ok(SessionEnd::Lost(Error::WebSocket(
                        "connection closed before complete".to_string(),
                    )))
                }
            };

            let frame: WsFrame = match message {
                Message::Text(text) => serde_json::from_str(&text)?,
                Message::Binary(bytes) => serde_json::from_slice(&bytes)?,
                Message::Ping(_) | Message::Pong(_) => continue,
                Message::Close(_) => {
                    return Ok(SessionEnd::Lost(Error::WebSocket(
                        "connection closed before complete".to_string(),
                    )))
                }
                _ => continue,
            };

            match frame.kind.as_str() {
                "next" => {
                    if let Some(payload) = frame.payload {
                        let response: GraphQLResponse = serde_json::from_value(payload)?;
                        if self.tx.send(Ok(response)).await.is_err() {
                            // Consumer dropped the stream.
                            return Ok(SessionEnd::Completed);
                        }
                    }
                }
                "error" => {
                    let detail = frame
                        .payload
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "operation rejected".to_string());
                    let _ = self.tx.send(Err(Error::Subscription(detail))).await;
                    return Ok(SessionEnd::Completed);
                }
                "complete" => return Ok(SessionEnd::Completed),
                "ping" => send_frame(&mut stream, &WsFrame::pong()).await?,
                "connection_ack" | "pong" => continue,
                other => {
                    tracing::debug!(frame = other, "ignoring unexpected frame");
                }
            }
        }
    }

    async fn await_ack(&self, stream: &mut WsStream) -> Result<()> {
        let ack = tokio::time::timeout(self.ack_timeout, async {
            loop {
                let frame: WsFrame = match stream.next().await {
                    Some(Ok(Message::Text(text))) => serde_json::from_str(&text)?,
                    Some(Ok(Message::Binary(bytes))) => serde_json::from_slice(&bytes)?,
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(Error::WebSocket(e.to_string())),
                    None => {
                        return Err(Error::WebSocket(
                            "connection closed before ack".to_string(),
                        ))
                    }
                };
                return match frame.kind.as_str() {
                    "connection_ack" => Ok(()),
                    other => Err(Error::Subscription(format!(
                        "expected connection_ack, got {other}"
                    ))),
                };
            }
        })
        .await;

        match ack {
            Ok(result) => result,
            Err(_) => Err(Error::Subscription(
                "timed out waiting for connection_ack".to_string(),
            )),
        }
    }
}

async fn send_frame(stream: &mut WsStream, frame: &WsFrame) -> Result<()> {
    let text = serde_json::to_string(frame)?;
    stream
        .send(Message::Text(text))
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))
}

fn backoff(attempt: u32, max: Duration) -> Duration {
    let exp = Duration::from_millis(250).saturating_mul(1u32 << attempt.min(8));
    exp.min(max)
}

/// Adapter exposing a [`SubscriptionClient`] as a [`Link`]
pub struct WebSocketLink {
    client: SubscriptionClient,
}

impl WebSocketLink {
    /// Wrap a subscription client
    pub fn new(client: SubscriptionClient) -> Self {
        Self { client }
    }

    /// The underlying subscription client
    pub fn client(&self) -> &SubscriptionClient {
        &self.client
    }
}

#[async_trait::async_trait]
impl Link for WebSocketLink {
    async fn request(&self, operation: Operation) -> Result<ResponseStream> {
        self.client.subscribe(operation).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_serialize_to_protocol_shape() {
        let init = WsFrame::connection_init(Some(json!({"authorization": "Bearer t"})));
        let value = serde_json::to_value(&init).unwrap();
        assert_eq!(
            value,
            json!({"type": "connection_init", "payload": {"authorization": "Bearer t"}})
        );

        let subscribe = WsFrame::subscribe("1", json!({"query": "subscription { tick }"}));
        let value = serde_json::to_value(&subscribe).unwrap();
        assert_eq!(value["type"], json!("subscribe"));
        assert_eq!(value["id"], json!("1"));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let max = Duration::from_secs(30);

        assert_eq!(backoff(1, max), Duration::from_millis(500));
        assert_eq!(backoff(2, max), Duration::from_millis(1000));
        assert_eq!(backoff(20, max), max);
    }

    #[test]
    fn client_defaults() {
        let client = SubscriptionClient::new("ws://localhost:4000/graphql/ws");

        assert_eq!(client.url(), "ws://localhost:4000/graphql/ws");
        assert!(client.reconnect);
        assert_eq!(client.ack_timeout, Duration::from_secs(10));
    }
}
