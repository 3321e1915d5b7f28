use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use super::broadcaster::RoomBroadcaster;
use super::messages::{ConnectionCountNotification, OutboundEvent, RelayFrame};
use crate::registry::ConnectionId;

/// Simple WebSocket abstraction - all we care about is send/receive of
/// relay frames
#[async_trait]
pub trait RelaySocket: Send {
    /// Send a frame to the client
    async fn send_frame(&mut self, frame: RelayFrame) -> Result<(), SocketError>;

    /// Receive the next frame from the client (None if connection closed)
    async fn receive_frame(&mut self) -> Result<Option<RelayFrame>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

#[derive(Debug)]
pub enum SocketError {
    SendFailed(String),
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl RelaySocket for WebSocket {
    async fn send_frame(&mut self, frame: RelayFrame) -> Result<(), SocketError> {
        let message = match frame {
            RelayFrame::Binary(bytes) => Message::Binary(bytes),
            RelayFrame::Text(text) => Message::Text(text),
        };
        self.send(message)
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_frame(&mut self) -> Result<Option<RelayFrame>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Binary(bytes))) => return Ok(Some(RelayFrame::Binary(bytes))),
                Some(Ok(Message::Text(text))) => return Ok(Some(RelayFrame::Text(text))),
                Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(_)) => continue, // Ignore ping/pong
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
                None => return Ok(None), // Connection closed
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// One live stream connection.
///
/// Owns the socket for its lifetime and runs the relay loop: inbound
/// frames go straight to the broadcaster, events routed to this handle
/// by the broadcaster go out on the socket. The outbound receiver is
/// the channel whose sending half was handed to the broadcaster at
/// subscribe time.
pub struct StreamConnection {
    language_code: String,
    handle: ConnectionId,
    socket: Box<dyn RelaySocket>,
    outbound_receiver: mpsc::UnboundedReceiver<OutboundEvent>,
    broadcaster: Arc<RoomBroadcaster>,
}

impl StreamConnection {
    pub fn new(
        language_code: String,
        handle: ConnectionId,
        socket: Box<dyn RelaySocket>,
        outbound_receiver: mpsc::UnboundedReceiver<OutboundEvent>,
        broadcaster: Arc<RoomBroadcaster>,
    ) -> Self {
        Self {
            language_code,
            handle,
            socket,
            outbound_receiver,
            broadcaster,
        }
    }

    /// Run the connection - relays in both directions until disconnect
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                // Handle outbound events (broadcaster -> client)
                event = self.outbound_receiver.recv() => {
                    match event {
                        Some(OutboundEvent::Relay(frame)) => {
                            self.socket.send_frame(frame).await?
                        }
                        Some(OutboundEvent::ConnectionCount { language, active_connections }) => {
                            let notification =
                                ConnectionCountNotification::new(language, active_connections);
                            match serde_json::to_string(&notification) {
                                Ok(json) => self.socket.send_frame(RelayFrame::Text(json)).await?,
                                Err(e) => {
                                    warn!(
                                        language = %self.language_code,
                                        handle = %self.handle,
                                        error = %e,
                                        "Failed to serialize count notification"
                                    );
                                }
                            }
                        }
                        None => break, // Channel closed, disconnect
                    }
                }

                // Handle inbound frames (client -> room)
                frame = self.socket.receive_frame() => {
                    match frame {
                        Ok(Some(frame)) => {
                            self.broadcaster
                                .publish(&self.language_code, frame)
                                .await;
                        }
                        Ok(None) => break, // Client disconnected
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.socket.close().await;
        Ok(())
    }
}
