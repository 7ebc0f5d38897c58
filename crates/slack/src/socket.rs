use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::{net::TcpStream, sync::Mutex, task::JoinSet};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, Message},
    MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info, warn};

use crate::blocks::AckPayload;
use crate::events::{parse_envelope, EventContext, EventDispatcher, SlackEnvelope, SlackEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
    #[error("slack requested a reconnect: {0}")]
    RefreshRequested(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl From<&polyglot_core::config::SocketConfig> for ReconnectPolicy {
    fn from(config: &polyglot_core::config::SocketConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(
        &self,
        envelope_id: &str,
        payload: Option<&AckPayload>,
    ) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: Arc<EventDispatcher>,
    reconnect_policy: ReconnectPolicy,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher: Arc::new(dispatcher), reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        let mut attempt = 0;
        loop {
            info!(attempt, "opening socket mode transport connection");
            let outcome = match self.transport.connect().await {
                Ok(()) => {
                    info!(attempt, "socket mode transport connected");
                    attempt = 0;
                    self.pump().await
                }
                Err(error) => Err(error),
            };

            match outcome {
                Ok(()) => return Ok(()),
                Err(TransportError::RefreshRequested(reason)) => {
                    info!(reason = %reason, "slack requested a socket refresh; reconnecting");
                }
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "socket mode retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Reads envelopes until the stream closes. Each envelope is acknowledged
    /// before its handler is spawned.
    async fn pump(&self) -> Result<(), TransportError> {
        let mut handlers = JoinSet::new();

        loop {
            while handlers.try_join_next().is_some() {}

            let envelope = match self.transport.next_envelope().await {
                Ok(Some(envelope)) => envelope,
                Ok(None) => break,
                Err(error) => {
                    handlers.detach_all();
                    return Err(error);
                }
            };
            let (channel_id, thread_ts) = correlation_fields(&envelope);

            info!(
                event_name = "ingress.slack.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                channel_id = channel_id.unwrap_or("unknown"),
                thread_ts = thread_ts.unwrap_or("unknown"),
                "received slack envelope"
            );

            let payload = self.dispatcher.acknowledgement(&envelope);
            if let Err(error) =
                self.transport.acknowledge(&envelope.envelope_id, payload.as_ref()).await
            {
                warn!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge slack envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    with_payload = payload.is_some(),
                    "acknowledged slack envelope"
                );
            }

            let dispatcher = Arc::clone(&self.dispatcher);
            handlers.spawn(async move {
                let context = EventContext { correlation_id: envelope.envelope_id.clone() };
                if let Err(error) = dispatcher.dispatch(&envelope, &context).await {
                    warn!(
                        envelope_id = %envelope.envelope_id,
                        correlation_id = %envelope.envelope_id,
                        error = %error,
                        "event dispatch failed; continuing socket loop"
                    );
                }
            });
        }

        info!("socket mode transport stream closed");
        while handlers.join_next().await.is_some() {}
        self.transport.disconnect().await
    }
}

fn correlation_fields(envelope: &SlackEnvelope) -> (Option<&str>, Option<&str>) {
    match &envelope.event {
        SlackEvent::ReactionAdded(event) => {
            (event.channel_id.as_deref(), event.message_ts.as_deref())
        }
        SlackEvent::Shortcut(_)
        | SlackEvent::ViewSubmission(_)
        | SlackEvent::Unsupported { .. } => (None, None),
    }
}

type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Deserialize)]
struct ConnectionsOpenResponse {
    ok: bool,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ControlFrame {
    #[serde(rename = "type")]
    frame_type: String,
    #[serde(default)]
    reason: Option<String>,
}

/// Socket Mode over a real WebSocket: `apps.connections.open` hands out a
/// single-use URL for each connection.
pub struct WebSocketTransport {
    http: Client,
    app_token: SecretString,
    api_base_url: String,
    stream: Mutex<Option<SocketStream>>,
}

impl WebSocketTransport {
    pub fn new(http: Client, app_token: SecretString, api_base_url: impl Into<String>) -> Self {
        let api_base_url = api_base_url.into().trim_end_matches('/').to_owned();
        Self { http, app_token, api_base_url, stream: Mutex::new(None) }
    }

    async fn open_connection_url(&self) -> Result<String, TransportError> {
        let response = self
            .http
            .post(format!("{}/apps.connections.open", self.api_base_url))
            .bearer_auth(self.app_token.expose_secret())
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let body: ConnectionsOpenResponse =
            response.json().await.map_err(|error| TransportError::Connect(error.to_string()))?;

        match (body.ok, body.url) {
            (true, Some(url)) => Ok(url),
            _ => Err(TransportError::Connect(format!(
                "apps.connections.open failed: {}",
                body.error.as_deref().unwrap_or("missing url")
            ))),
        }
    }
}

#[async_trait]
impl SocketTransport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let url = self.open_connection_url().await?;
        let (stream, _) =
            connect_async(url).await.map_err(|error| TransportError::Connect(error.to_string()))?;
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| TransportError::Receive("socket is not connected".to_owned()))?;

        loop {
            let Some(message) = stream.next().await else {
                return Err(TransportError::Receive("socket closed by peer".to_owned()));
            };
            let message = message.map_err(|error| TransportError::Receive(error.to_string()))?;

            match message {
                Message::Text(text) => {
                    let text = text.as_str();
                    if let Some(frame) = control_frame(text) {
                        match frame.frame_type.as_str() {
                            "disconnect" => {
                                return Err(TransportError::RefreshRequested(
                                    frame.reason.unwrap_or_else(|| "unspecified".to_owned()),
                                ));
                            }
                            other => {
                                debug!(frame_type = other, "socket mode control frame");
                                continue;
                            }
                        }
                    }

                    match parse_envelope(text) {
                        Ok(envelope) => return Ok(Some(envelope)),
                        Err(error) => {
                            let envelope_id = envelope_id_of(text);
                            if let Some(envelope_id) = &envelope_id {
                                stream
                                    .send(ack_frame(envelope_id, None))
                                    .await
                                    .map_err(acknowledge_failed)?;
                            }
                            warn!(
                                envelope_id = envelope_id.as_deref().unwrap_or("unknown"),
                                error = %error,
                                "dropping unparseable socket mode frame"
                            );
                        }
                    }
                }
                Message::Ping(data) => {
                    stream
                        .send(Message::Pong(data))
                        .await
                        .map_err(|error| TransportError::Receive(error.to_string()))?;
                }
                Message::Close(frame) => {
                    return Err(TransportError::Receive(format!(
                        "socket closed: {}",
                        frame.map(|frame| frame.reason.to_string()).unwrap_or_default()
                    )));
                }
                _ => {}
            }
        }
    }

    async fn acknowledge(
        &self,
        envelope_id: &str,
        payload: Option<&AckPayload>,
    ) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| TransportError::Acknowledge("socket is not connected".to_owned()))?;
        stream.send(ack_frame(envelope_id, payload)).await.map_err(acknowledge_failed)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return Ok(());
        };
        stream.close(None).await.map_err(|error| TransportError::Disconnect(error.to_string()))
    }
}

fn ack_frame(envelope_id: &str, payload: Option<&AckPayload>) -> Message {
    let ack = match payload {
        Some(payload) => json!({ "envelope_id": envelope_id, "payload": payload }),
        None => json!({ "envelope_id": envelope_id }),
    };
    Message::Text(ack.to_string().into())
}

fn acknowledge_failed(error: tungstenite::Error) -> TransportError {
    TransportError::Acknowledge(error.to_string())
}

/// Frames without an `envelope_id` (`hello`, `disconnect`) are control frames.
fn control_frame(text: &str) -> Option<ControlFrame> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    if value.get("envelope_id").is_some() {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Envelope id of a frame that may not parse as any known envelope.
fn envelope_id_of(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value.get("envelope_id")?.as_str().filter(|id| !id.is_empty()).map(str::to_owned)
}
