//! Session orchestration: track loads, instance lifecycle, user controls.
//!
//! A load runs as three steps driven by the host:
//!
//! 1. [`Session::begin_load`] hands out a [`LoadToken`] and supersedes any
//!    load already in flight.
//! 2. [`Session::accept_response`] turns the backend's answer into channels
//!    and instances (after disposing everything from the previous track).
//! 3. [`Session::finish_loading`] starts every channel in unison once the
//!    host has decoded all assets, or rolls everything back on failure.
//!
//! Responses carrying an old token are ignored, so a slow request for a
//! superseded track can never clobber the current one.

use crate::channel::{AudioGraph, ChannelRegistry, PlaybackHandle};
use crate::config::EngineConfig;
use crate::error::{Result, SessionError};
use crate::frame::{FrameDriver, RenderCommit};
use crate::instance::{initial_instance_id, spawned_instance_id, InstanceId, VisualInstance};
use crate::level::PlaybackStatus;
use crate::mapper::Archetype;
use crate::mix::{MixController, MixSettings};
use crate::stems::{SeparationResponse, StemKind, StemSet, VisualMapping};
use glam::Vec3;
use rand::prelude::*;
use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    /// Waiting on the backend for an uploaded file.
    Processing,
    /// Waiting on the backend for a source link.
    ProcessingLink,
    /// Channels exist; assets are being decoded.
    LoadingAudio,
    Playing,
}

impl SessionStatus {
    pub fn playback(self) -> PlaybackStatus {
        match self {
            SessionStatus::Playing => PlaybackStatus::Playing,
            _ => PlaybackStatus::Idle,
        }
    }

    pub fn is_busy(self) -> bool {
        matches!(
            self,
            SessionStatus::Processing | SessionStatus::ProcessingLink | SessionStatus::LoadingAudio
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Processing => "processing",
            SessionStatus::ProcessingLink => "processing link",
            SessionStatus::LoadingAudio => "loading audio",
            SessionStatus::Playing => "playing",
        };
        f.write_str(s)
    }
}

/// Where the track being loaded came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    File,
    Link,
}

/// Identifies one load attempt. Only the most recent token is honoured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

pub struct Session<G: AudioGraph> {
    config: EngineConfig,
    registry: ChannelRegistry<G>,
    instances: Vec<VisualInstance>,
    mapping: VisualMapping,
    mix: MixController,
    driver: FrameDriver,
    status: SessionStatus,
    generation: u64,
    stems: StemSet,
    rng: StdRng,
    notice: Option<String>,
}

impl<G: AudioGraph> Session<G> {
    pub fn new(graph: G, config: EngineConfig) -> Self {
        Self {
            registry: ChannelRegistry::new(graph),
            instances: Vec::new(),
            mapping: VisualMapping::default(),
            mix: MixController::new(&config),
            driver: FrameDriver::new(),
            status: SessionStatus::Idle,
            generation: 0,
            stems: StemSet::new(),
            rng: StdRng::seed_from_u64(config.seed),
            notice: None,
            config,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ChannelRegistry<G> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ChannelRegistry<G> {
        &mut self.registry
    }

    pub fn instances(&self) -> &[VisualInstance] {
        &self.instances
    }

    pub fn instance(&self, id: &InstanceId) -> Option<&VisualInstance> {
        self.instances.iter().find(|i| &i.id == id)
    }

    pub fn mapping(&self) -> &VisualMapping {
        &self.mapping
    }

    pub fn mix(&self) -> &MixController {
        &self.mix
    }

    pub fn driver_mut(&mut self) -> &mut FrameDriver {
        &mut self.driver
    }

    /// Stems present for the current track; spawn affordances follow this.
    pub fn available_stems(&self) -> &StemSet {
        &self.stems
    }

    /// Last user-facing message (errors, demo/cached notices).
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.generation
    }

    /// Start a new load. Any load already in flight becomes stale.
    pub fn begin_load(&mut self, source: LoadSource) -> LoadToken {
        self.generation += 1;
        self.status = match source {
            LoadSource::File => SessionStatus::Processing,
            LoadSource::Link => SessionStatus::ProcessingLink,
        };
        self.notice = None;
        log::info!("load {} started from {:?}", self.generation, source);
        LoadToken(self.generation)
    }

    fn check_current(&self, token: LoadToken) -> Result<()> {
        if self.is_current(token) {
            Ok(())
        } else {
            log::debug!(
                "ignoring result of load {} (current is {})",
                token.0,
                self.generation
            );
            Err(SessionError::StaleLoad(token.0))
        }
    }

    /// Parse and accept a raw backend body.
    pub fn accept_response_json(&mut self, token: LoadToken, body: &str) -> Result<usize> {
        self.check_current(token)?;
        match SeparationResponse::from_json(body) {
            Ok(resp) => self.accept_response(token, resp),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Build channels and instances for the stems the backend returned.
    /// Returns how many channels were created.
    pub fn accept_response(&mut self, token: LoadToken, response: SeparationResponse) -> Result<usize> {
        self.check_current(token)?;
        match response.into_stems() {
            Ok(stems) => self.load_stems(stems),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Replace the current track with `stems`. Everything from the previous
    /// track is disposed before any new channel is created.
    pub fn load_stems(&mut self, stems: StemSet) -> Result<usize> {
        self.registry.dispose_all();
        self.instances.clear();
        self.status = SessionStatus::LoadingAudio;

        if stems.is_demo {
            self.notice = Some("Demo mode: using example audio.".to_string());
        } else if stems.cached {
            self.notice = Some("Loaded stems from cache.".to_string());
        }
        self.mapping.ensure_for_stems(stems.kinds());

        for stem in stems.kinds() {
            let Some(url) = stems.url(stem) else {
                continue;
            };
            let id = initial_instance_id(stem);
            let position = self.clamp_position(stem.default_position());
            let inst = VisualInstance::new(id.clone(), stem, self.mapping.get(stem), position);
            if let Err(e) = self.registry.load_track(id, url) {
                return Err(self.fail(e.into()));
            }
            self.instances.push(inst);
        }
        self.stems = stems;
        self.refresh_all_mixes();
        log::info!("track ready to decode: {} channels", self.registry.len());
        Ok(self.registry.len())
    }

    /// Called once the host has decoded every asset (or failed to).
    pub fn finish_loading(
        &mut self,
        token: LoadToken,
        decoded: std::result::Result<(), String>,
    ) -> Result<()> {
        self.check_current(token)?;
        if self.status != SessionStatus::LoadingAudio {
            return Err(SessionError::NotReady(self.status));
        }
        if let Err(reason) = decoded {
            return Err(self.fail(SessionError::Load(reason)));
        }
        let at = self.registry.start_time(self.config.start_offset_sec);
        self.registry.start_all(at);
        self.status = SessionStatus::Playing;
        self.refresh_all_mixes();
        Ok(())
    }

    /// Top-level setup failure handler: roll back to idle and record the
    /// message for the user. Returns the error for propagation.
    pub fn fail(&mut self, err: SessionError) -> SessionError {
        if err.is_stale() {
            return err;
        }
        log::error!("{err}");
        self.registry.dispose_all();
        self.instances.clear();
        self.stems = StemSet::new();
        self.status = SessionStatus::Idle;
        self.notice = Some(err.to_string());
        err
    }

    /// Drop the current track and invalidate any in-flight load.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.registry.dispose_all();
        self.instances.clear();
        self.stems = StemSet::new();
        self.status = SessionStatus::Idle;
    }

    /// Add another instance of an available stem at a random spot near the
    /// centre. Starts immediately when the track is already playing.
    pub fn spawn_instance(&mut self, stem: StemKind, now_millis: u64) -> Result<InstanceId> {
        let url = self
            .stems
            .url(stem)
            .ok_or(SessionError::StemUnavailable(stem))?
            .to_string();
        let id = spawned_instance_id(stem, now_millis, |id| self.registry.contains(id));
        let jitter = crate::constants::SPAWN_JITTER;
        let x = self.rng.gen_range(-jitter..=jitter);
        let y = self.rng.gen_range(-jitter..=jitter);
        let position = self.clamp_position(Vec3::new(x, y, 0.0));
        let inst = VisualInstance::new(id.clone(), stem, self.mapping.get(stem), position);
        self.registry.load_track(id.clone(), &url)?;
        if self.status == SessionStatus::Playing {
            let now = self.registry.graph().current_time();
            if let Some(channel) = self.registry.get_mut(&id) {
                channel.player_mut().start_at(now);
            }
        }
        self.instances.push(inst);
        self.refresh_mix(self.instances.len() - 1);
        log::info!("spawned {id}");
        Ok(id)
    }

    /// Remove an instance and dispose its channel.
    pub fn remove_instance(&mut self, id: &InstanceId) -> Result<()> {
        let idx = self.index_of(id)?;
        let inst = self.instances.remove(idx);
        self.registry.remove(&inst.channel_id);
        log::info!("removed {id}");
        Ok(())
    }

    /// Drop an instance whose audio never arrived and tell the user why.
    /// An instance that is already gone (removed, or replaced by a newer
    /// load) is left alone and no notice is raised.
    pub fn abandon_instance(&mut self, id: &InstanceId, reason: &str) -> Result<()> {
        self.remove_instance(id)?;
        log::warn!("{id} abandoned: {reason}");
        self.set_notice(format!("Could not load {id}: {reason}"));
        Ok(())
    }

    /// Replace the user-visible notice.
    pub fn set_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(text.into());
    }

    /// Set the visual scale; playback rate follows as its inverse.
    pub fn set_instance_scale(&mut self, id: &InstanceId, scale: f32) -> Result<Option<MixSettings>> {
        let idx = self.index_of(id)?;
        let scale = self.config.scale_range.clamp_or(scale, 1.0);
        self.instances[idx].base_scale = scale;
        Ok(self.refresh_mix(idx))
    }

    pub fn set_instance_position(
        &mut self,
        id: &InstanceId,
        position: Vec3,
    ) -> Result<Option<MixSettings>> {
        let idx = self.index_of(id)?;
        self.instances[idx].position = self.clamp_position(position);
        Ok(self.refresh_mix(idx))
    }

    /// Change the global tempo; every channel's rate is recomputed.
    pub fn set_global_tempo(&mut self, bpm: f32) -> f32 {
        let base = self.config.base_bpm;
        let bpm = self.config.tempo_range.clamp_or(bpm, base);
        self.mix.set_global_bpm(bpm);
        self.refresh_all_mixes();
        bpm
    }

    /// Draw `stem` with `archetype` from now on, including existing instances.
    pub fn set_mapping(&mut self, stem: StemKind, archetype: Archetype) {
        self.mapping.set(stem, archetype);
        for inst in self.instances.iter_mut().filter(|i| i.stem == stem) {
            inst.set_archetype(archetype);
        }
    }

    /// Advance all visuals by one frame.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<RenderCommit>) {
        self.driver.tick(
            dt,
            self.status.playback(),
            &self.registry,
            &mut self.instances,
            out,
        );
    }

    fn index_of(&self, id: &InstanceId) -> Result<usize> {
        self.instances
            .iter()
            .position(|i| &i.id == id)
            .ok_or_else(|| SessionError::UnknownInstance(id.to_string()))
    }

    fn clamp_position(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.config.x_range.clamp_or(p.x, 0.0),
            self.config.y_range.clamp_or(p.y, 0.0),
            self.config.depth_range.clamp_or(p.z, 0.0),
        )
    }

    fn refresh_mix(&mut self, idx: usize) -> Option<MixSettings> {
        let inst = self.instances.get(idx)?;
        let channel = self.registry.get_mut(&inst.channel_id)?;
        Some(self.mix.update(channel, inst.position, inst.base_scale))
    }

    fn refresh_all_mixes(&mut self) {
        for idx in 0..self.instances.len() {
            self.refresh_mix(idx);
        }
    }
}
