use glam::Vec3;

// Shared tuning constants used by the engine and the web frontend.

// Level sampling
pub const DB_FLOOR: f64 = -100.0; // readings at or below are silence/uninitialized
pub const DB_CEIL: f64 = 100.0; // readings at or above are invalid
pub const METER_SMOOTHING: f32 = 0.8; // exponential smoothing of the RMS meter

// Mixing
pub const HORIZONTAL_RANGE: f32 = 8.0; // world X that maps to a hard pan
pub const DEPTH_GAIN_FACTOR: f32 = 2.0; // dB per world unit of depth
pub const BASE_BPM: f32 = 120.0; // tempo at which playback rate is unscaled

// Control ranges
pub const SCALE_MIN: f32 = 0.5;
pub const SCALE_MAX: f32 = 2.0;
pub const POSITION_X_RANGE: f32 = 6.0;
pub const POSITION_Y_RANGE: f32 = 6.0;
pub const DEPTH_MIN: f32 = -10.0;
pub const DEPTH_MAX: f32 = 0.0;
pub const TEMPO_MIN_BPM: f32 = 60.0;
pub const TEMPO_MAX_BPM: f32 = 180.0;

// Playback
pub const START_OFFSET_SEC: f64 = 0.1; // lead time so all stems start together
pub const SPAWN_JITTER: f32 = 2.0; // half-extent of the random spawn square

// Default layout for the five stems
pub const DEFAULT_STEM_POSITIONS: [[f32; 3]; 5] = [
    [0.0, 0.0, 0.0],  // drums
    [0.0, -3.5, 0.0], // bass
    [0.0, 3.5, 0.0],  // vocals
    [-5.0, 0.0, -2.0], // guitar
    [5.0, 0.0, -2.0], // piano
];

// Palette for the five stems
pub const DEFAULT_STEM_COLORS: [[f32; 3]; 5] = [
    [1.0, 0.0, 0.333],   // drums, hot pink
    [0.294, 0.0, 0.51],  // bass, indigo
    [0.0, 1.0, 1.0],     // vocals, cyan
    [1.0, 0.533, 0.0],   // guitar, orange
    [0.0, 1.0, 0.533],   // piano, green
];

#[inline]
pub fn default_position(index: usize) -> Vec3 {
    DEFAULT_STEM_POSITIONS
        .get(index)
        .map(|p| Vec3::from(*p))
        .unwrap_or(Vec3::ZERO)
}
