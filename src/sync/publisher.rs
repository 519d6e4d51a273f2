//! Admin half of the playback sync protocol.

use std::time::{Duration, Instant};

use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::dto::unix_millis;
use crate::dto::ws::{ClientMessage, PlaybackState, SeekTo, TrackEnded};

use super::PlayerControl;

/// Produces authoritative playback announcements from a local player.
///
/// While the owner holds room authority, [`SyncPublisher::poll`] emits one
/// `playbackState` per interval; gaining authority, flipping play/pause and
/// receiving a `requestState` all force an immediate tick, and a scrub emits
/// a `seekTo` with a companion announcement. Without authority every method
/// is silent.
#[derive(Debug)]
pub struct SyncPublisher {
    participant: String,
    interval: Duration,
    is_admin: bool,
    last_tick: Option<Instant>,
}

impl SyncPublisher {
    /// Create a publisher for the named participant.
    pub fn new(participant: impl Into<String>, interval: Duration) -> Self {
        Self {
            participant: participant.into(),
            interval,
            is_admin: false,
            last_tick: None,
        }
    }

    /// Create a publisher tuned from the application configuration.
    pub fn from_config(participant: impl Into<String>, config: &AppConfig) -> Self {
        Self::new(participant, config.broadcast_interval())
    }

    /// Update whether this participant holds room authority.
    ///
    /// Gaining authority clears the tick clock so the next poll announces
    /// immediately from the local position; losing it silences the publisher
    /// without disturbing the local player.
    pub fn set_authority(&mut self, is_admin: bool) {
        if is_admin && !self.is_admin {
            self.last_tick = None;
        }
        self.is_admin = is_admin;
    }

    /// Whether this participant currently holds room authority.
    pub fn is_authority(&self) -> bool {
        self.is_admin
    }

    /// Emit the periodic announcement when one is due.
    pub fn poll(&mut self, now: Instant, player: &dyn PlayerControl) -> Option<ClientMessage> {
        if !self.is_admin {
            return None;
        }
        let due = self
            .last_tick
            .is_none_or(|tick| now.duration_since(tick) >= self.interval);
        if !due {
            return None;
        }
        self.last_tick = Some(now);
        Some(self.announcement(player))
    }

    /// Announce a scrub: a `seekTo` plus a companion `playbackState` so late
    /// observers converge without waiting for the next interval.
    pub fn on_scrub(&mut self, now: Instant, player: &dyn PlayerControl) -> Vec<ClientMessage> {
        if !self.is_admin {
            return Vec::new();
        }
        self.last_tick = Some(now);
        vec![
            ClientMessage::SeekTo(SeekTo {
                position_seconds: player.position_secs(),
                admin_id: self.participant.clone(),
            }),
            self.announcement(player),
        ]
    }

    /// Announce a track change immediately so members converge on the new
    /// track's position without waiting for the next interval.
    pub fn on_track_changed(
        &mut self,
        now: Instant,
        player: &dyn PlayerControl,
    ) -> Option<ClientMessage> {
        self.immediate(now, player)
    }

    /// Announce a local play or pause flip immediately.
    pub fn on_playing_changed(
        &mut self,
        now: Instant,
        player: &dyn PlayerControl,
    ) -> Option<ClientMessage> {
        self.immediate(now, player)
    }

    /// Answer a member's `requestState` with an immediate announcement.
    pub fn on_state_request(
        &mut self,
        now: Instant,
        player: &dyn PlayerControl,
    ) -> Option<ClientMessage> {
        self.immediate(now, player)
    }

    /// Announce that the current track finished.
    pub fn track_ended(&self) -> Option<ClientMessage> {
        self.is_admin.then(|| {
            ClientMessage::TrackEnded(TrackEnded {
                admin_id: self.participant.clone(),
                message: "Current track ended".to_string(),
            })
        })
    }

    fn immediate(&mut self, now: Instant, player: &dyn PlayerControl) -> Option<ClientMessage> {
        if !self.is_admin {
            return None;
        }
        self.last_tick = Some(now);
        Some(self.announcement(player))
    }

    fn announcement(&self, player: &dyn PlayerControl) -> ClientMessage {
        ClientMessage::PlaybackState(PlaybackState {
            is_playing: player.is_playing(),
            position_seconds: player.position_secs(),
            admin_id: self.participant.clone(),
            timestamp: unix_millis(OffsetDateTime::now_utc()),
        })
    }
}
