//! Frame driver: once per rendered frame, sample → map → smooth → commit.
//!
//! The host calls [`FrameDriver::tick`] from its display-refresh callback.
//! Nothing here depends on a particular renderer; results are pushed as
//! [`RenderCommit`] values into a caller-owned buffer that is reused across
//! frames.

use crate::channel::{AudioGraph, ChannelRegistry};
use crate::instance::{InstanceId, VisualInstance};
use crate::level::{sample, PlaybackStatus};
use crate::mapper::{Archetype, MapInput, OrbTuning};
use crate::stems::StemKind;
use glam::Vec3;
use smallvec::SmallVec;
use std::time::Duration;

/// What the render surface receives for one instance this frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderCommit {
    pub instance_id: InstanceId,
    pub stem: StemKind,
    pub archetype: Archetype,
    pub position: Vec3,
    pub scale: f32,
    pub rotation: Vec3,
    pub color_blend: f32,
    pub emissive: f32,
    pub distortion: f32,
    pub displacement: f32,
    pub wave_phase: f32,
    pub children: SmallVec<[f32; 5]>,
    /// Raw energy that drove this frame, for debugging overlays.
    pub energy: f32,
}

#[derive(Clone, Debug, Default)]
pub struct FrameDriver {
    elapsed: f64,
    frames: u64,
    pub orb: OrbTuning,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the driver started.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Advance every instance by one frame. Per-instance state is
    /// level-triggered from `status`: a flip takes effect on this very tick.
    /// Instances whose channel is missing read zero energy.
    pub fn tick<G: AudioGraph>(
        &mut self,
        dt: Duration,
        status: PlaybackStatus,
        registry: &ChannelRegistry<G>,
        instances: &mut [VisualInstance],
        out: &mut Vec<RenderCommit>,
    ) {
        let dt_sec = dt.as_secs_f32();
        let dt_sec = if dt_sec.is_finite() { dt_sec } else { 0.0 };
        self.elapsed += dt_sec as f64;
        self.frames += 1;
        let t = self.elapsed as f32;

        out.clear();
        for inst in instances.iter_mut() {
            let rate = playback_rate_of(registry, inst);
            let (targets, energy) = if status.is_playing() {
                let reading = sample(&inst.channel_id, registry.meter(&inst.channel_id), status);
                // Mapping runs in f32; the reading stays f64 up to here.
                let energy = reading.linear_energy as f32;
                let input = MapInput::new(energy, t, inst.base_scale, rate);
                (inst.archetype.targets_with(&input, &self.orb), energy)
            } else {
                (inst.archetype.idle_targets(t, inst.base_scale, rate), 0.0)
            };
            inst.visual
                .advance(&targets, &inst.archetype.smoothing(), dt_sec);
            out.push(RenderCommit {
                instance_id: inst.id.clone(),
                stem: inst.stem,
                archetype: inst.archetype,
                position: inst.position + Vec3::new(0.0, targets.bob, 0.0),
                scale: inst.visual.scale.get(),
                rotation: inst.visual.rotation,
                color_blend: inst.visual.color_blend.get(),
                emissive: inst.visual.emissive.get(),
                distortion: inst.visual.distortion.get(),
                displacement: inst.visual.displacement.get(),
                wave_phase: inst.visual.phase,
                children: inst.visual.children.iter().map(|c| c.get()).collect(),
                energy,
            });
        }
    }
}

/// Rate last applied to the instance's channel; 1.0 when unbound.
fn playback_rate_of<G: AudioGraph>(registry: &ChannelRegistry<G>, inst: &VisualInstance) -> f32 {
    registry
        .get(&inst.channel_id)
        .and_then(|c| c.applied_mix())
        .map(|m| m.playback_rate)
        .unwrap_or(1.0)
}
