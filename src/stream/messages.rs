use serde::{Deserialize, Serialize};

/// A payload relayed verbatim between room members. Binary and text are
/// mutually exclusive per frame; the relay never inspects or transforms
/// the contents.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    Binary(Vec<u8>),
    Text(String),
}

/// Events the broadcaster routes to a session's outbound channel.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// A frame published by a room member, delivered verbatim.
    Relay(RelayFrame),
    /// The room's membership changed; carries the count at the time of
    /// the change.
    ConnectionCount {
        language: String,
        active_connections: usize,
    },
}

/// Notification types pushed to stream clients as structured text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    ConnectionCount,
}

/// Wire shape of the count notification sent over the stream socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionCountNotification {
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub language: String,
    pub active_connections: usize,
}

impl ConnectionCountNotification {
    pub fn new(language: String, active_connections: usize) -> Self {
        Self {
            notification_type: NotificationType::ConnectionCount,
            language,
            active_connections,
        }
    }
}

/// Response body for the connection count query endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionCountResponse {
    pub language: String,
    pub active_connections: usize,
}
