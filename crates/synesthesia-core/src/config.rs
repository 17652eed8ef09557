//! Runtime configuration for the engine.
//!
//! Defaults come from [`crate::constants`]; hosts override individual fields
//! (the web frontend reads the backend URL from the page query string).

use crate::constants::*;

/// Closed interval used to validate a bounded user control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `v` into the range. Non-finite input falls back to `fallback`,
    /// itself clamped.
    #[inline]
    pub fn clamp_or(&self, v: f32, fallback: f32) -> f32 {
        let v = if v.is_finite() { v } else { fallback };
        v.clamp(self.min, self.max)
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Base URL of the stem-separation service.
    pub backend_url: String,
    pub horizontal_range: f32,
    pub depth_factor: f32,
    pub base_bpm: f32,
    pub start_offset_sec: f64,
    pub scale_range: Range,
    pub x_range: Range,
    pub y_range: Range,
    pub depth_range: Range,
    pub tempo_range: Range,
    /// Seed for spawn-position jitter.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3001".to_string(),
            horizontal_range: HORIZONTAL_RANGE,
            depth_factor: DEPTH_GAIN_FACTOR,
            base_bpm: BASE_BPM,
            start_offset_sec: START_OFFSET_SEC,
            scale_range: Range::new(SCALE_MIN, SCALE_MAX),
            x_range: Range::new(-POSITION_X_RANGE, POSITION_X_RANGE),
            y_range: Range::new(-POSITION_Y_RANGE, POSITION_Y_RANGE),
            depth_range: Range::new(DEPTH_MIN, DEPTH_MAX),
            tempo_range: Range::new(TEMPO_MIN_BPM, TEMPO_MAX_BPM),
            seed: 0x5EED_5157,
        }
    }
}

impl EngineConfig {
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.backend_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn separate_endpoint(&self) -> String {
        format!("{}/separate", self.backend_url)
    }

    pub fn link_endpoint(&self) -> String {
        format!("{}/process-youtube", self.backend_url)
    }
}
