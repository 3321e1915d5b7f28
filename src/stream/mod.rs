// Public API
pub use broadcaster::{OutboundSender, RoomBroadcaster};
pub use handler::{connections_count, stream_handler};
pub use messages::{
    ConnectionCountNotification, ConnectionCountResponse, OutboundEvent, RelayFrame,
};
pub use socket::{RelaySocket, SocketError, StreamConnection};

// Internal modules
mod broadcaster;
mod handler;
mod messages;
mod socket;
