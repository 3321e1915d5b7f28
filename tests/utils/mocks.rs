use async_trait::async_trait;
use tokio::sync::mpsc;

use interpcast::{RelayFrame, RelaySocket, SocketError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Scriptable stream socket backed by channels.
///
/// The test pushes "client" frames through the returned sender and
/// observes everything the session writes back on the returned receiver.
/// Dropping the sender looks like a client disconnect.
pub struct MockRelaySocket {
    inbound: mpsc::UnboundedReceiver<RelayFrame>,
    sent: mpsc::UnboundedSender<RelayFrame>,
}

impl MockRelaySocket {
    pub fn new() -> (
        Self,
        mpsc::UnboundedSender<RelayFrame>,
        mpsc::UnboundedReceiver<RelayFrame>,
    ) {
        let (client_sender, inbound) = mpsc::unbounded_channel();
        let (sent, sent_receiver) = mpsc::unbounded_channel();
        (Self { inbound, sent }, client_sender, sent_receiver)
    }
}

#[async_trait]
impl RelaySocket for MockRelaySocket {
    async fn send_frame(&mut self, frame: RelayFrame) -> Result<(), SocketError> {
        self.sent
            .send(frame)
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_frame(&mut self) -> Result<Option<RelayFrame>, SocketError> {
        Ok(self.inbound.recv().await)
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        Ok(())
    }
}
