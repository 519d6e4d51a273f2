//! Non-admin half of the playback sync protocol.

use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::dto::ws::{ClientMessage, PlaybackState, SeekTo};

use super::{PlayerControl, valid_position};

/// Reconciles a local player against the admin's announcements.
///
/// Small drift is tolerated up to the configured threshold so the player is
/// not constantly re-seeked over jittery transport; explicit scrubs always
/// apply. A member who paused locally keeps their pause until they resume,
/// at which point [`SyncFollower::resume`] hands back the `requestState`
/// message that re-fetches the authoritative position.
#[derive(Debug)]
pub struct SyncFollower {
    threshold_secs: f64,
    manually_paused: bool,
    last_admin: Option<String>,
}

impl SyncFollower {
    /// Create a follower with the given drift tolerance in seconds.
    pub fn new(threshold_secs: f64) -> Self {
        Self {
            threshold_secs,
            manually_paused: false,
            last_admin: None,
        }
    }

    /// Create a follower tuned from the application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.sync_threshold_secs())
    }

    /// Apply a periodic `playbackState` announcement to the local player.
    pub fn on_playback_state(&mut self, state: &PlaybackState, player: &mut dyn PlayerControl) {
        if !valid_position(state.position_seconds) {
            warn!(
                position = state.position_seconds,
                "discarding playback announcement with unusable position"
            );
            return;
        }
        self.last_admin = Some(state.admin_id.clone());

        let drift = (player.position_secs() - state.position_seconds).abs();
        if drift > self.threshold_secs {
            debug!(drift, target = state.position_seconds, "correcting playback drift");
            player.seek_to(state.position_seconds);
        }

        if state.is_playing {
            if !self.manually_paused && !player.is_playing() {
                player.play();
            }
        } else if player.is_playing() {
            player.pause();
        }
    }

    /// Apply an explicit scrub announcement to the local player.
    pub fn on_seek_to(&mut self, seek: &SeekTo, player: &mut dyn PlayerControl) {
        if !valid_position(seek.position_seconds) {
            warn!(
                position = seek.position_seconds,
                "discarding scrub announcement with unusable position"
            );
            return;
        }
        self.last_admin = Some(seek.admin_id.clone());
        player.seek_to(seek.position_seconds);
    }

    /// Record that the member paused on purpose; announcements stop
    /// restarting playback until [`SyncFollower::resume`] is called.
    pub fn note_manual_pause(&mut self) {
        self.manually_paused = true;
    }

    /// Clear the manual pause and return the message that asks the admin for
    /// an immediate announcement.
    pub fn resume(&mut self) -> ClientMessage {
        self.manually_paused = false;
        ClientMessage::RequestState
    }

    /// Admin id of the most recent applied announcement.
    pub fn last_admin(&self) -> Option<&str> {
        self.last_admin.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::FakePlayer;

    fn announcement(position_secs: f64, is_playing: bool) -> PlaybackState {
        PlaybackState {
            is_playing,
            position_seconds: position_secs,
            admin_id: "admin".to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn drift_beyond_threshold_triggers_a_seek() {
        let mut follower = SyncFollower::new(2.0);
        let mut player = FakePlayer {
            position_secs: 10.0,
            playing: true,
            ..FakePlayer::default()
        };

        follower.on_playback_state(&announcement(12.5, true), &mut player);

        assert_eq!(player.seeks, vec![12.5]);
        assert_eq!(follower.last_admin(), Some("admin"));
    }

    #[test]
    fn drift_within_threshold_is_tolerated() {
        let mut follower = SyncFollower::new(2.0);
        let mut player = FakePlayer {
            position_secs: 10.0,
            playing: true,
            ..FakePlayer::default()
        };

        follower.on_playback_state(&announcement(11.5, true), &mut player);

        assert!(player.seeks.is_empty());
    }

    #[test]
    fn play_flag_is_followed_both_ways() {
        let mut follower = SyncFollower::new(2.0);
        let mut player = FakePlayer::default();

        follower.on_playback_state(&announcement(0.0, true), &mut player);
        assert!(player.playing);

        follower.on_playback_state(&announcement(0.5, false), &mut player);
        assert!(!player.playing);
    }

    #[test]
    fn manual_pause_suppresses_remote_play_until_resume() {
        let mut follower = SyncFollower::new(2.0);
        let mut player = FakePlayer::default();

        follower.note_manual_pause();
        follower.on_playback_state(&announcement(0.0, true), &mut player);
        assert!(!player.playing);

        assert_eq!(follower.resume(), ClientMessage::RequestState);
        follower.on_playback_state(&announcement(1.0, true), &mut player);
        assert!(player.playing);
    }

    #[test]
    fn scrub_applies_without_drift_check() {
        let mut follower = SyncFollower::new(2.0);
        let mut player = FakePlayer {
            position_secs: 10.0,
            ..FakePlayer::default()
        };

        let seek = SeekTo {
            position_seconds: 10.5,
            admin_id: "admin".to_string(),
        };
        follower.on_seek_to(&seek, &mut player);

        assert_eq!(player.seeks, vec![10.5]);
    }

    #[test]
    fn unusable_positions_are_discarded() {
        let mut follower = SyncFollower::new(2.0);
        let mut player = FakePlayer::default();

        follower.on_playback_state(&announcement(f64::NAN, true), &mut player);
        follower.on_playback_state(&announcement(-3.0, true), &mut player);

        assert!(player.seeks.is_empty());
        assert!(!player.playing);
        assert_eq!(follower.last_admin(), None);
    }
}
