//! External room-membership collaborator: the durable side of rooms (member
//! lists, the designated admin, the track queue, notifications) lives outside
//! this process. The relay only consumes the admin identity and fires
//! membership/queue updates at it without waiting on the outcome.

use std::error::Error;

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexSet;
use thiserror::Error;

/// Result alias for collaborator operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Error raised by a room directory backend regardless of the underlying store.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The backend could not be reached or answered with a failure.
    #[error("room directory unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl DirectoryError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        DirectoryError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Collaborator interface for room membership, admin designation, the track
/// queue, and the notification feed.
///
/// Every mutation is fire-and-forget from the relay's perspective: failures
/// are logged by the caller, never surfaced back into the protocol.
pub trait RoomDirectory: Send + Sync {
    /// Currently designated admin (room owner) for the room, if any.
    fn admin_of(&self, room: &str) -> BoxFuture<'static, DirectoryResult<Option<String>>>;
    /// Record that a participant opened a connection into the room.
    fn note_join(&self, room: &str, participant: &str) -> BoxFuture<'static, DirectoryResult<()>>;
    /// Remove a departed participant from the room's member list.
    fn remove_member(&self, room: &str, participant: &str)
    -> BoxFuture<'static, DirectoryResult<()>>;
    /// Hand the admin role to another member if the departing participant held it.
    fn reassign_admin(&self, room: &str, departing: &str)
    -> BoxFuture<'static, DirectoryResult<()>>;
    /// Advance to the next queued track for the room.
    fn advance_queue(&self, room: &str) -> BoxFuture<'static, DirectoryResult<()>>;
    /// Append a notification line to the room's feed.
    fn append_notification(&self, room: &str, text: &str)
    -> BoxFuture<'static, DirectoryResult<()>>;
}

#[derive(Debug, Default)]
struct RoomRecord {
    admin: Option<String>,
    members: IndexSet<String>,
    notifications: Vec<String>,
    queue_advances: usize,
}

/// In-memory [`RoomDirectory`] used by tests and standalone deployments.
///
/// The first participant to join a room becomes its admin; when the admin
/// departs the role moves to the longest-connected remaining member.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    rooms: DashMap<String, RoomRecord>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a room with an explicit admin and member set.
    pub fn seed_room(&self, room: &str, admin: &str, members: &[&str]) {
        let mut record = RoomRecord {
            admin: Some(admin.to_string()),
            ..RoomRecord::default()
        };
        record.members.insert(admin.to_string());
        for member in members {
            record.members.insert((*member).to_string());
        }
        self.rooms.insert(room.to_string(), record);
    }

    /// Notifications appended to a room so far, oldest first.
    pub fn notifications(&self, room: &str) -> Vec<String> {
        self.rooms
            .get(room)
            .map(|record| record.notifications.clone())
            .unwrap_or_default()
    }

    /// Number of queue-advance triggers received for a room.
    pub fn queue_advances(&self, room: &str) -> usize {
        self.rooms
            .get(room)
            .map(|record| record.queue_advances)
            .unwrap_or_default()
    }
}

impl RoomDirectory for MemoryDirectory {
    fn admin_of(&self, room: &str) -> BoxFuture<'static, DirectoryResult<Option<String>>> {
        let admin = self.rooms.get(room).and_then(|record| record.admin.clone());
        Box::pin(async move { Ok(admin) })
    }

    fn note_join(&self, room: &str, participant: &str) -> BoxFuture<'static, DirectoryResult<()>> {
        let mut record = self.rooms.entry(room.to_string()).or_default();
        record.members.insert(participant.to_string());
        if record.admin.is_none() {
            record.admin = Some(participant.to_string());
        }
        Box::pin(async move { Ok(()) })
    }

    fn remove_member(
        &self,
        room: &str,
        participant: &str,
    ) -> BoxFuture<'static, DirectoryResult<()>> {
        if let Some(mut record) = self.rooms.get_mut(room) {
            record.members.shift_remove(participant);
        }
        Box::pin(async move { Ok(()) })
    }

    fn reassign_admin(
        &self,
        room: &str,
        departing: &str,
    ) -> BoxFuture<'static, DirectoryResult<()>> {
        if let Some(mut record) = self.rooms.get_mut(room)
            && record.admin.as_deref() == Some(departing)
        {
            record.admin = record
                .members
                .iter()
                .find(|member| member.as_str() != departing)
                .cloned();
        }
        Box::pin(async move { Ok(()) })
    }

    fn advance_queue(&self, room: &str) -> BoxFuture<'static, DirectoryResult<()>> {
        if let Some(mut record) = self.rooms.get_mut(room) {
            record.queue_advances += 1;
        }
        Box::pin(async move { Ok(()) })
    }

    fn append_notification(
        &self,
        room: &str,
        text: &str,
    ) -> BoxFuture<'static, DirectoryResult<()>> {
        if let Some(mut record) = self.rooms.get_mut(room) {
            record.notifications.push(text.to_string());
        }
        Box::pin(async move { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_joiner_becomes_admin() {
        let directory = MemoryDirectory::new();
        directory.note_join("lounge", "alice").await.unwrap();
        directory.note_join("lounge", "bob").await.unwrap();

        assert_eq!(
            directory.admin_of("lounge").await.unwrap(),
            Some("alice".to_string())
        );
    }

    #[tokio::test]
    async fn admin_moves_to_next_member_on_departure() {
        let directory = MemoryDirectory::new();
        directory.seed_room("lounge", "alice", &["bob", "carol"]);

        directory.remove_member("lounge", "alice").await.unwrap();
        directory.reassign_admin("lounge", "alice").await.unwrap();

        assert_eq!(
            directory.admin_of("lounge").await.unwrap(),
            Some("bob".to_string())
        );
    }

    #[tokio::test]
    async fn reassign_leaves_admin_alone_for_non_admin_departure() {
        let directory = MemoryDirectory::new();
        directory.seed_room("lounge", "alice", &["bob"]);

        directory.reassign_admin("lounge", "bob").await.unwrap();

        assert_eq!(
            directory.admin_of("lounge").await.unwrap(),
            Some("alice".to_string())
        );
    }

    #[tokio::test]
    async fn queue_and_notifications_accumulate() {
        let directory = MemoryDirectory::new();
        directory.seed_room("lounge", "alice", &[]);

        directory.advance_queue("lounge").await.unwrap();
        directory
            .append_notification("lounge", "Current track ended, starting next track...")
            .await
            .unwrap();

        assert_eq!(directory.queue_advances("lounge"), 1);
        assert_eq!(directory.notifications("lounge").len(), 1);
    }
}
