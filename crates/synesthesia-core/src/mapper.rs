//! Parameter mapping: energy and time in, visual targets out.
//!
//! Every function here is pure. Given the same [`MapInput`] an archetype
//! always returns the same [`VisualTargets`]; state lives in the smoothing
//! layer only.

use crate::smoothing::SmoothingProfile;
use glam::Vec3;
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::str::FromStr;

/// Fixed visual behaviour of an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Archetype {
    /// Pulsing, distorting sphere that flashes hot on loud hits.
    Orb,
    /// Wireframe wave strip whose amplitude follows energy.
    Ring,
    /// Floating knot, always bobbing.
    Knot,
    /// Three shards that fly apart with energy.
    ShardCluster,
    /// Five bars that jump with energy.
    StackedBar,
}

pub const ALL_ARCHETYPES: [Archetype; 5] = [
    Archetype::Orb,
    Archetype::Ring,
    Archetype::Knot,
    Archetype::ShardCluster,
    Archetype::StackedBar,
];

/// Everything a mapper may depend on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapInput {
    pub energy: f32,
    pub elapsed: f32,
    pub base_scale: f32,
    pub playback_rate: f32,
}

impl MapInput {
    pub fn new(energy: f32, elapsed: f32, base_scale: f32, playback_rate: f32) -> Self {
        Self {
            energy,
            elapsed,
            base_scale,
            playback_rate,
        }
    }

    /// Replace unusable values: energy and time with 0, negative energy with
    /// 0, scale and rate with 1.
    fn sanitized(&self) -> Self {
        let finite_pos = |v: f32| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        Self {
            energy: if self.energy.is_finite() {
                self.energy.max(0.0)
            } else {
                0.0
            },
            elapsed: if self.elapsed.is_finite() {
                self.elapsed
            } else {
                0.0
            },
            base_scale: finite_pos(self.base_scale),
            playback_rate: finite_pos(self.playback_rate),
        }
    }
}

/// Target values for one frame. Rotation rates are radians per second.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualTargets {
    pub scale: f32,
    /// 0 holds the base hue, 1 is fully "hot".
    pub color_blend: f32,
    pub emissive: f32,
    pub rotation_rate: Vec3,
    pub distortion: f32,
    /// Vertex amplitude (Ring) or radial expansion (ShardCluster).
    pub displacement: f32,
    /// Vertical offset added to the instance position.
    pub bob: f32,
    /// Wave phase speed in radians per second (Ring only).
    pub phase_rate: f32,
    /// Per-child offsets: shard X positions or bar lifts.
    pub children: SmallVec<[f32; 5]>,
}

impl Default for VisualTargets {
    fn default() -> Self {
        Self {
            scale: 1.0,
            color_blend: 0.0,
            emissive: 1.0,
            rotation_rate: Vec3::ZERO,
            distortion: 0.0,
            displacement: 0.0,
            bob: 0.0,
            phase_rate: 0.0,
            children: SmallVec::new(),
        }
    }
}

/// Orb response curve. `scale = base * k1 + energy * k2 * base`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbTuning {
    pub k1: f32,
    pub k2: f32,
    pub distortion_base: f32,
    pub distortion_gain: f32,
    pub hot_threshold: f32,
}

impl Default for OrbTuning {
    fn default() -> Self {
        Self {
            k1: 2.0,
            k2: 0.8,
            distortion_base: 0.3,
            distortion_gain: 4.0,
            hot_threshold: 0.4,
        }
    }
}

pub const SHARD_COUNT: usize = 3;
pub const BAR_COUNT: usize = 5;
const SHARD_SPACING: f32 = 1.5;
const SHARD_EXPANSION: f32 = 3.0;
const BAR_SPACING: f32 = 0.6;
const BAR_BASE: f32 = -1.5;

impl Archetype {
    pub fn name(self) -> &'static str {
        match self {
            Archetype::Orb => "Orb",
            Archetype::Ring => "Ring",
            Archetype::Knot => "Knot",
            Archetype::ShardCluster => "ShardCluster",
            Archetype::StackedBar => "StackedBar",
        }
    }

    pub fn child_count(self) -> usize {
        match self {
            Archetype::ShardCluster => SHARD_COUNT,
            Archetype::StackedBar => BAR_COUNT,
            _ => 0,
        }
    }

    /// Percussive visuals react fast; sustained ones glide.
    pub fn smoothing(self) -> SmoothingProfile {
        match self {
            Archetype::Orb => SmoothingProfile {
                scale: 0.4,
                color: 0.3,
                emissive: 0.3,
                distortion: 0.1,
                displacement: 0.2,
                children: 0.2,
            },
            Archetype::Ring => SmoothingProfile {
                scale: 0.12,
                displacement: 0.2,
                ..SmoothingProfile::uniform(0.12)
            },
            Archetype::Knot => SmoothingProfile::uniform(0.05),
            Archetype::ShardCluster => SmoothingProfile {
                scale: 0.1,
                children: 0.2,
                ..SmoothingProfile::uniform(0.2)
            },
            Archetype::StackedBar => SmoothingProfile {
                scale: 0.1,
                children: 0.3,
                ..SmoothingProfile::uniform(0.2)
            },
        }
    }

    /// Targets while the track is playing.
    pub fn targets(self, input: &MapInput) -> VisualTargets {
        self.targets_with(input, &OrbTuning::default())
    }

    pub fn targets_with(self, input: &MapInput, orb: &OrbTuning) -> VisualTargets {
        let MapInput {
            energy: e,
            elapsed: t,
            base_scale: s,
            playback_rate: r,
        } = input.sanitized();
        match self {
            Archetype::Orb => VisualTargets {
                scale: s * orb.k1 + e * orb.k2 * s,
                color_blend: if e > orb.hot_threshold { 1.0 } else { 0.0 },
                emissive: 2.0,
                rotation_rate: Vec3::new(0.0, 0.24 + e * 3.0, 0.0),
                distortion: orb.distortion_base + e * orb.distortion_gain,
                ..VisualTargets::default()
            },
            Archetype::Ring => VisualTargets {
                scale: s * (1.0 + e * 0.2),
                emissive: 3.0,
                rotation_rate: Vec3::new(0.0, 0.0, (0.048 + e * 0.6) * r),
                displacement: 0.2 + e * 4.0 * s,
                phase_rate: 3.0 * r,
                ..VisualTargets::default()
            },
            Archetype::Knot => VisualTargets {
                scale: s * 0.8 + e * 1.5 * s,
                emissive: 1.2,
                rotation_rate: Vec3::new(0.2 * r, 0.3 * r, 0.0),
                bob: knot_bob(t),
                ..VisualTargets::default()
            },
            Archetype::ShardCluster => {
                let expansion = 1.0 + e * SHARD_EXPANSION;
                VisualTargets {
                    scale: s,
                    emissive: 1.0 + e * 2.0,
                    rotation_rate: Vec3::new(6.0 * expansion, (0.6 + e * 3.0) * r, -1.2),
                    displacement: expansion,
                    children: shard_offsets(expansion),
                    ..VisualTargets::default()
                }
            }
            Archetype::StackedBar => VisualTargets {
                scale: s,
                emissive: 1.0 + e * 5.0,
                rotation_rate: Vec3::new(0.0, 0.2 * r, 0.0),
                children: (0..BAR_COUNT)
                    .map(|i| bar_rest(i) + (t * 5.0 + i as f32 * 0.5).sin() * e * 2.0)
                    .collect(),
                ..VisualTargets::default()
            },
        }
    }

    /// Energy-independent motion used whenever the track is not playing.
    pub fn idle_targets(self, elapsed: f32, base_scale: f32, playback_rate: f32) -> VisualTargets {
        let MapInput {
            elapsed: t,
            base_scale: s,
            playback_rate: r,
            ..
        } = MapInput::new(0.0, elapsed, base_scale, playback_rate).sanitized();
        let breath = (t * 2.0).sin();
        match self {
            Archetype::Orb => VisualTargets {
                scale: s * 2.0 + breath * 0.1,
                emissive: 2.0,
                rotation_rate: Vec3::new(0.0, 0.24, 0.0),
                distortion: 0.3,
                ..VisualTargets::default()
            },
            Archetype::Ring => VisualTargets {
                scale: s,
                emissive: 3.0,
                rotation_rate: Vec3::new(0.0, 0.0, 0.048 * r),
                displacement: 0.2 + breath * 0.05,
                phase_rate: 1.0,
                ..VisualTargets::default()
            },
            Archetype::Knot => VisualTargets {
                scale: s * 0.8 + breath * 0.05 * s,
                emissive: 1.2,
                rotation_rate: Vec3::new(0.2 * r, 0.3 * r, 0.0),
                bob: knot_bob(t),
                ..VisualTargets::default()
            },
            Archetype::ShardCluster => {
                let expansion = 1.0 + breath * 0.05;
                VisualTargets {
                    scale: s,
                    emissive: 1.0,
                    rotation_rate: Vec3::new(0.6, 0.3 * r, 0.0),
                    displacement: expansion,
                    children: shard_offsets(expansion),
                    ..VisualTargets::default()
                }
            }
            Archetype::StackedBar => VisualTargets {
                scale: s,
                emissive: 1.0,
                rotation_rate: Vec3::new(0.0, 0.1 * r, 0.0),
                children: (0..BAR_COUNT)
                    .map(|i| bar_rest(i) + (t + i as f32 * 0.5).sin() * 0.05)
                    .collect(),
                ..VisualTargets::default()
            },
        }
    }

    /// Targets at rest, used to seed smoothing state for a new instance.
    pub fn rest_targets(self, base_scale: f32) -> VisualTargets {
        self.idle_targets(0.0, base_scale, 1.0)
    }
}

#[inline]
fn knot_bob(t: f32) -> f32 {
    (t * 0.5).sin() * 0.3
}

#[inline]
fn bar_rest(i: usize) -> f32 {
    i as f32 * BAR_SPACING + BAR_BASE
}

fn shard_offsets(expansion: f32) -> SmallVec<[f32; 5]> {
    let mut out: SmallVec<[f32; 5]> = smallvec![0.0; SHARD_COUNT];
    for (i, v) in out.iter_mut().enumerate() {
        *v = (i as f32 - 1.0) * SHARD_SPACING * expansion;
    }
    out
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Archetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "orb" => Ok(Archetype::Orb),
            "ring" | "torus" | "wave" | "terrain" => Ok(Archetype::Ring),
            "knot" | "cloud" | "comet" => Ok(Archetype::Knot),
            "shardcluster" | "shard-cluster" | "shards" => Ok(Archetype::ShardCluster),
            "stackedbar" | "stacked-bar" | "bars" | "helix" => Ok(Archetype::StackedBar),
            other => Err(format!("unknown archetype '{other}'")),
        }
    }
}
