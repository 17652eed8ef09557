//! On-screen objects bound to a channel, plus their smoothed runtime state.

use crate::channel::ChannelId;
use crate::mapper::{Archetype, VisualTargets};
use crate::smoothing::{Smoothed, SmoothingProfile};
use crate::stems::StemKind;
use glam::Vec3;
use smallvec::SmallVec;

pub type InstanceId = ChannelId;

/// Smoothed values owned by one instance. Only the frame driver mutates this.
#[derive(Clone, Debug)]
pub struct VisualState {
    pub scale: Smoothed,
    pub color_blend: Smoothed,
    pub emissive: Smoothed,
    pub distortion: Smoothed,
    pub displacement: Smoothed,
    pub children: SmallVec<[Smoothed; 5]>,
    /// Accumulated rotation in radians, wrapped to one turn.
    pub rotation: Vec3,
    /// Accumulated wave phase in radians, wrapped to one turn.
    pub phase: f32,
}

impl VisualState {
    pub fn at_rest(archetype: Archetype, base_scale: f32) -> Self {
        let rest = archetype.rest_targets(base_scale);
        Self {
            scale: Smoothed::new(rest.scale),
            color_blend: Smoothed::new(rest.color_blend),
            emissive: Smoothed::new(rest.emissive),
            distortion: Smoothed::new(rest.distortion),
            displacement: Smoothed::new(rest.displacement),
            children: rest.children.iter().map(|v| Smoothed::new(*v)).collect(),
            rotation: Vec3::ZERO,
            phase: 0.0,
        }
    }

    /// One smoothing step toward `targets`, then integrate rotation and phase.
    pub fn advance(&mut self, targets: &VisualTargets, profile: &SmoothingProfile, dt: f32) {
        self.scale.step(targets.scale, profile.scale);
        self.color_blend.step(targets.color_blend, profile.color);
        self.emissive.step(targets.emissive, profile.emissive);
        self.distortion.step(targets.distortion, profile.distortion);
        self.displacement.step(targets.displacement, profile.displacement);

        if self.children.len() != targets.children.len() {
            // Only happens after an archetype change.
            self.children = targets.children.iter().map(|v| Smoothed::new(*v)).collect();
        } else {
            for (c, t) in self.children.iter_mut().zip(targets.children.iter()) {
                c.step(*t, profile.children);
            }
        }

        let turn = std::f32::consts::TAU;
        let delta = targets.rotation_rate * dt;
        if delta.is_finite() {
            self.rotation = Vec3::new(
                (self.rotation.x + delta.x) % turn,
                (self.rotation.y + delta.y) % turn,
                (self.rotation.z + delta.z) % turn,
            );
        }
        let dphase = targets.phase_rate * dt;
        if dphase.is_finite() {
            self.phase = (self.phase + dphase) % turn;
        }
    }
}

#[derive(Clone, Debug)]
pub struct VisualInstance {
    pub id: InstanceId,
    /// Channel this instance reads its energy from. Not owned.
    pub channel_id: ChannelId,
    pub stem: StemKind,
    pub archetype: Archetype,
    pub base_scale: f32,
    pub position: Vec3,
    pub visual: VisualState,
}

impl VisualInstance {
    pub fn new(id: InstanceId, stem: StemKind, archetype: Archetype, position: Vec3) -> Self {
        Self {
            channel_id: id.clone(),
            id,
            stem,
            archetype,
            base_scale: 1.0,
            position,
            visual: VisualState::at_rest(archetype, 1.0),
        }
    }

    /// Switch behaviour; smoothing restarts from the new archetype's rest pose.
    pub fn set_archetype(&mut self, archetype: Archetype) {
        if self.archetype != archetype {
            self.archetype = archetype;
            self.visual = VisualState::at_rest(archetype, self.base_scale);
        }
    }
}

/// `{stem}-0` for the initial instance of a stem.
pub fn initial_instance_id(stem: StemKind) -> InstanceId {
    InstanceId::new(format!("{}-0", stem.key()))
}

/// `{stem}-{millis}` for a user spawn, bumped until it does not collide.
pub fn spawned_instance_id(
    stem: StemKind,
    now_millis: u64,
    taken: impl Fn(&InstanceId) -> bool,
) -> InstanceId {
    let mut stamp = now_millis;
    loop {
        let id = InstanceId::new(format!("{}-{}", stem.key(), stamp));
        if !taken(&id) {
            return id;
        }
        stamp = stamp.wrapping_add(1);
    }
}
