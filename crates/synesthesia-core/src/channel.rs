//! Channel registry: one playback handle plus one level meter per stem channel.
//!
//! The audio engine itself sits behind [`AudioGraph`]. The web frontend backs
//! it with WebAudio nodes; tests back it with counters.

use crate::error::AudioError;
use crate::mix::MixSettings;
use fnv::FnvHashMap;
use std::fmt;

/// Stable key for a channel, e.g. `drums-0` or `bass-1700000000`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A looping audio source for one stem.
pub trait PlaybackHandle {
    /// Schedule playback at an absolute audio-clock time in seconds.
    fn start_at(&mut self, when: f64);
    fn stop(&mut self);
    fn set_pan(&mut self, pan: f32);
    fn set_gain_db(&mut self, gain_db: f32);
    fn set_playback_rate(&mut self, rate: f32);
    fn dispose(&mut self);
}

/// Instantaneous loudness of a channel.
pub trait MeterHandle {
    /// Current level in dB, or `None` while the meter has nothing to report.
    fn read_db(&self) -> Option<f64>;
    fn dispose(&mut self);
}

/// Factory for player/meter pairs. The meter must be wired to the player
/// before `create_pair` returns, and the tap point must not move afterwards.
pub trait AudioGraph {
    type Player: PlaybackHandle;
    type Meter: MeterHandle;

    fn create_pair(
        &mut self,
        id: &ChannelId,
        source_url: &str,
    ) -> Result<(Self::Player, Self::Meter), AudioError>;

    /// Current audio-clock time in seconds.
    fn current_time(&self) -> f64;
}

pub struct Channel<G: AudioGraph> {
    pub id: ChannelId,
    pub source_url: String,
    player: G::Player,
    meter: G::Meter,
    /// Last mix written to the player; `None` until the first apply.
    pub(crate) mix: Option<MixSettings>,
}

impl<G: AudioGraph> Channel<G> {
    pub fn player_mut(&mut self) -> &mut G::Player {
        &mut self.player
    }

    pub fn meter(&self) -> &G::Meter {
        &self.meter
    }

    pub fn applied_mix(&self) -> Option<MixSettings> {
        self.mix
    }

    fn release(mut self) {
        self.player.stop();
        // Meter goes first so it never outlives the player it taps.
        self.meter.dispose();
        self.player.dispose();
    }
}

pub struct ChannelRegistry<G: AudioGraph> {
    graph: G,
    channels: FnvHashMap<ChannelId, Channel<G>>,
}

impl<G: AudioGraph> ChannelRegistry<G> {
    pub fn new(graph: G) -> Self {
        Self {
            graph,
            channels: FnvHashMap::default(),
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// Create the player/meter pair for a stem. An empty url means the
    /// backend did not return this stem; that is not an error and yields `None`.
    /// An existing channel with the same id is disposed first.
    pub fn load_track(
        &mut self,
        id: ChannelId,
        source_url: &str,
    ) -> Result<Option<&mut Channel<G>>, AudioError> {
        if source_url.trim().is_empty() {
            log::debug!("no source for channel {id}, skipping");
            return Ok(None);
        }
        if let Some(old) = self.channels.remove(&id) {
            log::warn!("replacing existing channel {id}");
            old.release();
        }
        let (player, meter) = self.graph.create_pair(&id, source_url)?;
        log::info!("loaded channel {id} from {source_url}");
        let channel = Channel {
            id: id.clone(),
            source_url: source_url.to_string(),
            player,
            meter,
            mix: None,
        };
        Ok(Some(self.channels.entry(id).or_insert(channel)))
    }

    /// Stop and release every channel, then clear the registry.
    pub fn dispose_all(&mut self) {
        let count = self.channels.len();
        for (_, channel) in self.channels.drain() {
            channel.release();
        }
        if count > 0 {
            log::info!("disposed {count} channels");
        }
    }

    /// Stop and release one channel. Returns whether it existed.
    pub fn remove(&mut self, id: &ChannelId) -> bool {
        match self.channels.remove(id) {
            Some(channel) => {
                channel.release();
                log::debug!("removed channel {id}");
                true
            }
            None => false,
        }
    }

    /// Start every channel at the same audio-clock time.
    pub fn start_all(&mut self, at: f64) {
        for channel in self.channels.values_mut() {
            channel.player.start_at(at);
        }
        log::info!("started {} channels at t={at:.3}", self.channels.len());
    }

    /// `current_time() + offset`, the shared start time for [`Self::start_all`].
    pub fn start_time(&self, offset: f64) -> f64 {
        self.graph.current_time() + offset.max(0.0)
    }

    pub fn get(&self, id: &ChannelId) -> Option<&Channel<G>> {
        self.channels.get(id)
    }

    pub fn get_mut(&mut self, id: &ChannelId) -> Option<&mut Channel<G>> {
        self.channels.get_mut(id)
    }

    pub fn meter(&self, id: &ChannelId) -> Option<&G::Meter> {
        self.channels.get(id).map(|c| &c.meter)
    }

    pub fn contains(&self, id: &ChannelId) -> bool {
        self.channels.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Channel ids in sorted order.
    pub fn ids(&self) -> Vec<ChannelId> {
        let mut ids: Vec<_> = self.channels.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl<G: AudioGraph> Drop for ChannelRegistry<G> {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
