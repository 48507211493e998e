//! WebSocket subscription gateway
//!
//! `GatewayServer` exposes the hub at `GET /ws`. Each upgraded socket is
//! registered with the hub, may subscribe to any number of channels, and
//! receives every message published to them until it disconnects.
//!
//! # Protocol
//!
//! See [`crate::protocol`] for the JSON frames. The server also sends a
//! WebSocket ping every `ping_interval` so idle viewers behind proxies stay
//! connected.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shipyard_protocol::ChannelName;

use crate::error::Result;
use crate::hub::ChannelHub;
use crate::protocol::{ClientFrame, ServerFrame};

/// Path of the WebSocket endpoint
pub const WS_PATH: &str = "/ws";

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayServerConfig {
    /// Interval between WebSocket pings
    pub ping_interval: Duration,
}

impl Default for GatewayServerConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl GatewayServerConfig {
    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }
}

/// WebSocket front end of a [`ChannelHub`]
#[derive(Clone)]
pub struct GatewayServer {
    config: GatewayServerConfig,
    hub: Arc<ChannelHub>,
    /// Closes every open socket on shutdown
    cancel: CancellationToken,
}

impl GatewayServer {
    /// Create a new gateway
    pub fn new(hub: Arc<ChannelHub>, config: GatewayServerConfig, cancel: CancellationToken) -> Self {
        Self {
            config,
            hub,
            cancel,
        }
    }

    /// Get the hub
    pub fn hub(&self) -> &Arc<ChannelHub> {
        &self.hub
    }

    /// Router serving the WebSocket endpoint
    pub fn router(&self) -> Router {
        Router::new()
            .route(WS_PATH, get(ws_handler))
            .with_state(self.clone())
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(gateway): State<GatewayServer>) -> Response {
    ws.on_upgrade(move |socket| async move { gateway.handle_socket(socket).await })
}

impl GatewayServer {
    /// Serve one upgraded socket until either side closes
    async fn handle_socket(self, mut socket: WebSocket) {
        let (connection_id, mut receiver) = match self.hub.connect() {
            Ok(registered) => registered,
            Err(e) => {
                warn!(error = %e, "rejecting websocket connection");
                let frame = ServerFrame::Error(e.to_string()).to_json();
                let _ = socket.send(Message::Text(frame.into())).await;
                let _ = socket.send(Message::Close(None)).await;
                return;
            }
        };

        info!(connection_id, "viewer connected");

        let period = self.config.ping_interval;
        let mut ping_timer = interval_at(Instant::now() + period, period);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }

                // Frame from the viewer
                incoming = socket.recv() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reply) = handle_text_frame(&self.hub, connection_id, text.as_str()) {
                                if socket.send(Message::Text(reply.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            debug!(error = %e, connection_id, "websocket read failed");
                            break;
                        }
                    }
                }

                // Message for a joined channel
                outgoing = receiver.recv() => {
                    let Some(message) = outgoing else { break };
                    let frame = ServerFrame::Message(message.to_string()).to_json();
                    if let Err(e) = socket.send(Message::Text(frame.into())).await {
                        debug!(error = %e, connection_id, "failed to send message to viewer");
                        break;
                    }
                }

                _ = ping_timer.tick() => {
                    if socket.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }

        let _ = self.hub.disconnect(connection_id);
        info!(connection_id, "viewer disconnected");
    }
}

/// Apply one text frame from a viewer
///
/// Returns an error frame to send back, or `None` when the request was
/// served. A successful subscribe answers through the connection queue.
pub fn handle_text_frame(hub: &ChannelHub, connection_id: u64, text: &str) -> Option<String> {
    match subscribe_from_text(hub, connection_id, text) {
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, connection_id, "rejected client frame");
            Some(ServerFrame::Error(e.to_string()).to_json())
        }
    }
}

fn subscribe_from_text(hub: &ChannelHub, connection_id: u64, text: &str) -> Result<ChannelName> {
    let ClientFrame::Subscribe(name) = ClientFrame::parse(text)?;
    let channel = ChannelName::parse(&name)?;
    hub.join(connection_id, &channel)?;
    Ok(channel)
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
