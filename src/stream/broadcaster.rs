use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

use super::messages::{OutboundEvent, RelayFrame};
use crate::registry::{ConnectionId, ConnectionRegistry};

pub type OutboundSender = mpsc::UnboundedSender<OutboundEvent>;

/// Fans events out to every live connection in a language room.
///
/// Each subscriber hands over the sending half of its session's outbound
/// channel; delivery is fire-and-forget per recipient, so one closed
/// connection never blocks the rest of a broadcast.
///
/// Membership changes go through `subscribe`/`unsubscribe`, which update
/// the registry and announce the new count inside a single write-lock
/// section. Holding the lock across mutate + count snapshot + fan-out
/// keeps a near-simultaneous join and leave on the same room from
/// publishing counts that are already stale when sent.
pub struct RoomBroadcaster {
    registry: Arc<ConnectionRegistry>,
    // language code -> handle -> outbound channel
    rooms: RwLock<HashMap<String, HashMap<ConnectionId, OutboundSender>>>,
}

impl RoomBroadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection as a delivery target for a room, join the
    /// registry, and announce the new count to every member including
    /// the one that just joined. Re-subscribing an already-subscribed
    /// handle is a no-op.
    pub async fn subscribe(&self, language_code: &str, handle: ConnectionId, sender: OutboundSender) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(language_code.to_string()).or_default();
        if members.insert(handle, sender).is_some() {
            return;
        }

        self.registry.join(language_code, handle).await;
        let count = self.registry.count(language_code).await;

        debug!(
            language = %language_code,
            handle = %handle,
            active_connections = count,
            "Connection subscribed to stream"
        );

        if let Some(members) = rooms.get(language_code) {
            Self::fan_out(
                language_code,
                members,
                &OutboundEvent::ConnectionCount {
                    language: language_code.to_string(),
                    active_connections: count,
                },
            );
        }
    }

    /// Deregister a connection, leave the registry, and announce the new
    /// count to the remaining members. A no-op for handles that were
    /// never subscribed, so a racing double-close cannot double-decrement.
    pub async fn unsubscribe(&self, language_code: &str, handle: ConnectionId) {
        let mut rooms = self.rooms.write().await;
        let (removed, emptied) = match rooms.get_mut(language_code) {
            Some(members) => {
                let removed = members.remove(&handle).is_some();
                (removed, members.is_empty())
            }
            None => (false, false),
        };
        if !removed {
            return;
        }
        if emptied {
            rooms.remove(language_code);
        }

        self.registry.leave(language_code, handle).await;
        let count = self.registry.count(language_code).await;

        debug!(
            language = %language_code,
            handle = %handle,
            active_connections = count,
            "Connection unsubscribed from stream"
        );

        if let Some(members) = rooms.get(language_code) {
            Self::fan_out(
                language_code,
                members,
                &OutboundEvent::ConnectionCount {
                    language: language_code.to_string(),
                    active_connections: count,
                },
            );
        }
    }

    /// Deliver a relayed frame to every current subscriber of a room.
    /// The sender is not excluded; clients that want echo suppression
    /// must filter on their side.
    pub async fn publish(&self, language_code: &str, frame: RelayFrame) {
        let rooms = self.rooms.read().await;
        if let Some(members) = rooms.get(language_code) {
            Self::fan_out(language_code, members, &OutboundEvent::Relay(frame));
        }
    }

    /// Push the room's current count to every subscriber.
    pub async fn broadcast_count(&self, language_code: &str) {
        let count = self.registry.count(language_code).await;
        let rooms = self.rooms.read().await;
        if let Some(members) = rooms.get(language_code) {
            Self::fan_out(
                language_code,
                members,
                &OutboundEvent::ConnectionCount {
                    language: language_code.to_string(),
                    active_connections: count,
                },
            );
        }
    }

    fn fan_out(
        language_code: &str,
        members: &HashMap<ConnectionId, OutboundSender>,
        event: &OutboundEvent,
    ) {
        for (handle, sender) in members {
            if sender.send(event.clone()).is_err() {
                // Receiver already dropped; its session is tearing down.
                debug!(
                    language = %language_code,
                    handle = %handle,
                    "Skipping delivery to closed connection"
                );
            }
        }
    }
}
