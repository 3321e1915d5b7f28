// Library crate for the live interpretation relay server
// This file exposes the public API for integration tests

pub mod auth;
pub mod registry;
pub mod shared;
pub mod stream;

// Re-export commonly used types for easier access in tests
pub use auth::{Authenticator, Identity, JwtAuthenticator, StaffClaims, TokenConfig};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use shared::{AppError, AppState};
pub use stream::{
    ConnectionCountNotification, ConnectionCountResponse, OutboundEvent, RelayFrame, RelaySocket,
    RoomBroadcaster, SocketError, StreamConnection,
};
