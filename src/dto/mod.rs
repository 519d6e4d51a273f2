//! Wire-level data transfer objects shared by the relay and its clients.

use time::OffsetDateTime;

pub mod health;
pub mod validation;
pub mod ws;

/// Milliseconds since the Unix epoch, clamped at zero for pre-epoch clocks.
pub(crate) fn unix_millis(time: OffsetDateTime) -> u64 {
    (time.unix_timestamp_nanos() / 1_000_000).max(0) as u64
}
