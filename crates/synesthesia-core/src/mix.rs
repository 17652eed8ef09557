//! Mix controller: map an instance's spatial controls onto its channel.
//!
//! Writes are idempotent. [`MixController::apply`] compares against the mix
//! last written to the channel and only touches parameters that changed, so
//! repeated UI updates never re-patch the audio graph.

use crate::channel::{AudioGraph, Channel, PlaybackHandle};
use crate::config::EngineConfig;
use glam::Vec3;

/// Effective audio parameters for one channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixSettings {
    /// Stereo position in [-1, 1].
    pub pan: f32,
    /// Attenuation in dB, never above 0.
    pub gain_db: f32,
    pub playback_rate: f32,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            pan: 0.0,
            gain_db: 0.0,
            playback_rate: 1.0,
        }
    }
}

/// Which fields an [`MixController::apply`] call actually wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixChanges {
    pub pan: bool,
    pub gain: bool,
    pub rate: bool,
}

impl MixChanges {
    pub fn any(&self) -> bool {
        self.pan || self.gain || self.rate
    }
}

#[derive(Clone, Debug)]
pub struct MixController {
    pub horizontal_range: f32,
    pub depth_factor: f32,
    pub base_bpm: f32,
    global_bpm: f32,
}

impl MixController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            horizontal_range: config.horizontal_range,
            depth_factor: config.depth_factor,
            base_bpm: config.base_bpm,
            global_bpm: config.base_bpm,
        }
    }

    pub fn global_bpm(&self) -> f32 {
        self.global_bpm
    }

    pub fn set_global_bpm(&mut self, bpm: f32) {
        if bpm.is_finite() && bpm > 0.0 {
            self.global_bpm = bpm;
        }
    }

    /// `global_bpm / base_bpm`, 1.0 when either is unusable.
    pub fn tempo_factor(&self) -> f32 {
        if self.base_bpm > 0.0 && self.base_bpm.is_finite() {
            self.global_bpm / self.base_bpm
        } else {
            1.0
        }
    }

    #[inline]
    pub fn pan_for(&self, x: f32) -> f32 {
        if !x.is_finite() || self.horizontal_range <= 0.0 {
            return 0.0;
        }
        (x / self.horizontal_range).clamp(-1.0, 1.0)
    }

    #[inline]
    pub fn gain_db_for(&self, depth: f32) -> f32 {
        if !depth.is_finite() {
            return 0.0;
        }
        (depth * self.depth_factor).min(0.0)
    }

    /// Rate is the inverse of the visual scale, stretched by the global tempo.
    #[inline]
    pub fn rate_for(&self, base_scale: f32) -> f32 {
        if !base_scale.is_finite() || base_scale <= 0.0 {
            return self.tempo_factor();
        }
        (1.0 / base_scale) * self.tempo_factor()
    }

    /// Depth is the z component of the position.
    pub fn compute(&self, position: Vec3, base_scale: f32) -> MixSettings {
        MixSettings {
            pan: self.pan_for(position.x),
            gain_db: self.gain_db_for(position.z),
            playback_rate: self.rate_for(base_scale),
        }
    }

    /// Write `settings` to the channel, skipping fields that already hold
    /// that value.
    pub fn apply<G: AudioGraph>(&self, channel: &mut Channel<G>, settings: MixSettings) -> MixChanges {
        let previous = channel.mix;
        let changes = MixChanges {
            pan: previous.map_or(true, |p| p.pan != settings.pan),
            gain: previous.map_or(true, |p| p.gain_db != settings.gain_db),
            rate: previous.map_or(true, |p| p.playback_rate != settings.playback_rate),
        };
        let player = channel.player_mut();
        if changes.pan {
            player.set_pan(settings.pan);
        }
        if changes.gain {
            player.set_gain_db(settings.gain_db);
        }
        if changes.rate {
            player.set_playback_rate(settings.playback_rate);
        }
        channel.mix = Some(settings);
        if changes.any() {
            log::debug!("mix {}: {:?} {:?}", channel.id, settings, changes);
        }
        changes
    }

    /// Compute and apply in one step.
    pub fn update<G: AudioGraph>(
        &self,
        channel: &mut Channel<G>,
        position: Vec3,
        base_scale: f32,
    ) -> MixSettings {
        let settings = self.compute(position, base_scale);
        self.apply(channel, settings);
        settings
    }
}
