//! Playback synchronization state machines.
//!
//! Two halves of the same protocol: the room admin runs a [`SyncPublisher`]
//! that turns local player state into periodic `playbackState` announcements
//! (plus immediate ticks on scrubs, play/pause flips and state requests),
//! while every other member runs a [`SyncFollower`] that reconciles the
//! local player against those announcements. Neither half owns a socket or
//! a player; both operate on a [`PlayerControl`] handle and return the wire
//! messages to send, which keeps the protocol rules testable in isolation.

mod follower;
mod publisher;

pub use follower::SyncFollower;
pub use publisher::SyncPublisher;

/// Control surface of a local media player.
pub trait PlayerControl {
    /// Current playhead position in seconds.
    fn position_secs(&self) -> f64;
    /// Whether the player is currently playing.
    fn is_playing(&self) -> bool;
    /// Jump the playhead to an absolute position.
    fn seek_to(&mut self, position_secs: f64);
    /// Start playback.
    fn play(&mut self);
    /// Pause playback.
    fn pause(&mut self);
}

/// A playhead position usable for reconciliation.
pub(crate) fn valid_position(position_secs: f64) -> bool {
    position_secs.is_finite() && position_secs >= 0.0
}

#[cfg(test)]
pub(crate) mod testing {
    use super::PlayerControl;

    /// In-memory player recording every control call.
    #[derive(Debug, Default)]
    pub struct FakePlayer {
        pub position_secs: f64,
        pub playing: bool,
        pub seeks: Vec<f64>,
    }

    impl PlayerControl for FakePlayer {
        fn position_secs(&self) -> f64 {
            self.position_secs
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn seek_to(&mut self, position_secs: f64) {
            self.seeks.push(position_secs);
            self.position_secs = position_secs;
        }

        fn play(&mut self) {
            self.playing = true;
        }

        fn pause(&mut self) {
            self.playing = false;
        }
    }
}
