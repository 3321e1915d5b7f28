use std::collections::{HashMap, HashSet};
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Opaque identifier for one live stream connection.
///
/// Minted once at handshake acceptance and never reused while the
/// connection is open. Used as the membership key in both the registry
/// and the broadcaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Tracks which connections are live in each language room.
///
/// This is the single source of truth for active connection counts.
/// A connection belongs to exactly one room for its lifetime; the room
/// is fixed at handshake time.
pub struct ConnectionRegistry {
    // language code -> set of live connection handles
    rooms: RwLock<HashMap<String, HashSet<ConnectionId>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add a connection to a room. Re-adding the same handle is a no-op.
    pub async fn join(&self, language_code: &str, handle: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(language_code.to_string())
            .or_default()
            .insert(handle);
    }

    /// Remove a connection from a room. A no-op if the handle was never
    /// joined, so a disconnect racing a failed join is harmless.
    pub async fn leave(&self, language_code: &str, handle: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        let emptied = match rooms.get_mut(language_code) {
            Some(members) => {
                members.remove(&handle);
                members.is_empty()
            }
            None => return,
        };
        if emptied {
            rooms.remove(language_code);
        }
    }

    /// Current number of live connections in a room. Unknown rooms count
    /// as zero.
    pub async fn count(&self, language_code: &str) -> usize {
        let rooms = self.rooms.read().await;
        rooms.get(language_code).map_or(0, |members| members.len())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
