//! Level sampling: turn a meter's decibel reading into linear energy.

use crate::channel::{ChannelId, MeterHandle};
use crate::constants::{DB_CEIL, DB_FLOOR};

/// Global playback status as seen by the per-frame path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
}

impl PlaybackStatus {
    #[inline]
    pub fn is_playing(self) -> bool {
        matches!(self, PlaybackStatus::Playing)
    }
}

/// One frame's reading for one channel. Never cached across frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergySample<'a> {
    pub channel_id: &'a ChannelId,
    /// Raw meter reading; `-inf` when there was nothing to read.
    pub db: f64,
    pub linear_energy: f64,
}

/// `10^(db/20)`.
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Convert a raw reading to energy, rejecting silence, invalid and
/// non-finite values. Peaks above 0 dB yield energy above 1.
#[inline]
pub fn energy_from_db(db: f64) -> f64 {
    if !db.is_finite() || db <= DB_FLOOR || db >= DB_CEIL {
        return 0.0;
    }
    db_to_gain(db)
}

/// Energy for a channel this frame. Idle status or a missing meter yields 0.
pub fn sample_energy<M: MeterHandle + ?Sized>(meter: Option<&M>, status: PlaybackStatus) -> f64 {
    if !status.is_playing() {
        return 0.0;
    }
    match meter.and_then(|m| m.read_db()) {
        Some(db) => energy_from_db(db),
        None => 0.0,
    }
}

/// Like [`sample_energy`] but keeps the raw reading alongside.
pub fn sample<'a, M: MeterHandle + ?Sized>(
    channel_id: &'a ChannelId,
    meter: Option<&M>,
    status: PlaybackStatus,
) -> EnergySample<'a> {
    let db = if status.is_playing() {
        meter.and_then(|m| m.read_db()).unwrap_or(f64::NEG_INFINITY)
    } else {
        f64::NEG_INFINITY
    };
    EnergySample {
        channel_id,
        db,
        linear_energy: energy_from_db(db),
    }
}
