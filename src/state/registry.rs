//! Registry of live WebSocket connections, grouped by room.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// Handle used to push messages to a connected room member.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    /// Participant id the handle belongs to.
    pub participant: String,
    /// Distinguishes this connection from a later one under the same id.
    pub conn_id: Uuid,
    /// Writer-task channel for the socket.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Live connections keyed by room, then by participant id.
///
/// One connection per (room, participant): registering under an occupied id
/// displaces the previous connection, which is told to close. Deregistration
/// carries the connection tag so a stale handler unwinding late cannot evict
/// the successor that displaced it.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    rooms: DashMap<String, DashMap<String, PeerHandle>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a connection, closing any previous one under the same id.
    pub fn register(&self, room: &str, handle: PeerHandle) {
        let members = self.rooms.entry(room.to_string()).or_default();
        if let Some(previous) = members.insert(handle.participant.clone(), handle) {
            info!(
                room = %room,
                participant = %previous.participant,
                "closing displaced connection"
            );
            let _ = previous.tx.send(Message::Close(None));
        }
    }

    /// Remove a connection, but only while it is still the registered one.
    ///
    /// Returns whether a connection was removed.
    pub fn deregister(&self, room: &str, participant: &str, conn_id: Uuid) -> bool {
        let Some(members) = self.rooms.get(room) else {
            return false;
        };
        let removed = members
            .remove_if(participant, |_, handle| handle.conn_id == conn_id)
            .is_some();
        drop(members);

        self.rooms.remove_if(room, |_, members| members.is_empty());
        removed
    }

    /// Participant ids currently connected to a room, in registration order
    /// as far as the map preserves it.
    pub fn members(&self, room: &str) -> Vec<String> {
        self.rooms
            .get(room)
            .map(|members| members.iter().map(|entry| entry.key().clone()).collect())
            .unwrap_or_default()
    }

    /// Connection handle of one room member, if connected.
    pub fn peer(&self, room: &str, participant: &str) -> Option<PeerHandle> {
        self.rooms
            .get(room)?
            .get(participant)
            .map(|entry| entry.value().clone())
    }

    /// Connection handles of every member of a room.
    pub fn peers(&self, room: &str) -> Vec<PeerHandle> {
        self.rooms
            .get(room)
            .map(|members| members.iter().map(|entry| entry.value().clone()).collect())
            .unwrap_or_default()
    }

    /// Number of rooms with at least one live connection.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
