use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use interpcast::{
    ConnectionCountNotification, ConnectionId, ConnectionRegistry, RelayFrame, RoomBroadcaster,
    StreamConnection,
};

use super::mocks::MockRelaySocket;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

#[derive(Clone)]
pub struct TestSetup {
    pub registry: Arc<ConnectionRegistry>,
    pub broadcaster: Arc<RoomBroadcaster>,
}

impl TestSetup {
    pub fn new() -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(RoomBroadcaster::new(Arc::clone(&registry)));
        Self {
            registry,
            broadcaster,
        }
    }

    /// Spin up a full relay session over a mock socket, mirroring what
    /// the WebSocket handler does once the handshake is accepted:
    /// subscribe, run the relay loop, unsubscribe on termination.
    pub async fn connect(&self, language_code: &str) -> TestClient {
        let handle = ConnectionId::new();
        let (socket, client_sender, sent_receiver) = MockRelaySocket::new();
        let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel();

        self.broadcaster
            .subscribe(language_code, handle, outbound_sender)
            .await;

        let connection = StreamConnection::new(
            language_code.to_string(),
            handle,
            Box::new(socket),
            outbound_receiver,
            Arc::clone(&self.broadcaster),
        );

        let broadcaster = Arc::clone(&self.broadcaster);
        let language = language_code.to_string();
        let session = tokio::spawn(async move {
            let _ = connection.run().await;
            broadcaster.unsubscribe(&language, handle).await;
        });

        TestClient {
            client_sender: Some(client_sender),
            sent_receiver,
            session,
        }
    }
}

/// One connected test client: drives the inbound side of the socket and
/// asserts on what the session delivers back.
pub struct TestClient {
    client_sender: Option<mpsc::UnboundedSender<RelayFrame>>,
    sent_receiver: mpsc::UnboundedReceiver<RelayFrame>,
    session: JoinHandle<()>,
}

impl TestClient {
    pub fn send_text(&self, text: &str) {
        self.client_sender
            .as_ref()
            .expect("client already disconnected")
            .send(RelayFrame::Text(text.to_string()))
            .expect("session receive loop is gone");
    }

    pub fn send_binary(&self, bytes: Vec<u8>) {
        self.client_sender
            .as_ref()
            .expect("client already disconnected")
            .send(RelayFrame::Binary(bytes))
            .expect("session receive loop is gone");
    }

    /// Close the client side and wait for the session's cleanup
    /// (unsubscribe + count broadcast) to finish.
    pub async fn disconnect(mut self) {
        self.client_sender = None;
        timeout(Duration::from_secs(1), self.session)
            .await
            .expect("session did not shut down")
            .expect("session task panicked");
    }

    pub async fn next_frame(&mut self) -> RelayFrame {
        timeout(Duration::from_secs(1), self.sent_receiver.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("session closed the socket")
    }

    pub async fn expect_text(&mut self, expected: &str) {
        match self.next_frame().await {
            RelayFrame::Text(text) => assert_eq!(text, expected),
            other => panic!("Expected text frame, got {:?}", other),
        }
    }

    pub async fn expect_binary(&mut self, expected: &[u8]) {
        match self.next_frame().await {
            RelayFrame::Binary(bytes) => assert_eq!(bytes, expected),
            other => panic!("Expected binary frame, got {:?}", other),
        }
    }

    pub async fn expect_count(&mut self, language: &str, expected: usize) {
        match self.next_frame().await {
            RelayFrame::Text(json) => {
                let notification: ConnectionCountNotification =
                    serde_json::from_str(&json).expect("frame is not a count notification");
                assert_eq!(notification.language, language);
                assert_eq!(notification.active_connections, expected);
            }
            other => panic!("Expected count notification, got {:?}", other),
        }
    }

    pub async fn expect_no_frame(&mut self) {
        let result = timeout(Duration::from_millis(100), self.sent_receiver.recv()).await;
        if let Ok(Some(frame)) = result {
            panic!("Expected silence, got {:?}", frame);
        }
    }
}
