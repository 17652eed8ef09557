//! Stems returned by the separation backend and their default visuals.

use crate::constants::{default_position, DEFAULT_STEM_COLORS};
use crate::error::SessionError;
use crate::mapper::Archetype;
use glam::Vec3;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StemKind {
    Drums,
    Bass,
    Vocals,
    Guitar,
    Piano,
}

pub const ALL_STEMS: [StemKind; 5] = [
    StemKind::Drums,
    StemKind::Bass,
    StemKind::Vocals,
    StemKind::Guitar,
    StemKind::Piano,
];

impl StemKind {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Key used by the backend and in instance ids.
    pub fn key(self) -> &'static str {
        match self {
            StemKind::Drums => "drums",
            StemKind::Bass => "bass",
            StemKind::Vocals => "vocals",
            StemKind::Guitar => "guitar",
            StemKind::Piano => "piano",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            StemKind::Drums => "Drums",
            StemKind::Bass => "Bass",
            StemKind::Vocals => "Vocals",
            StemKind::Guitar => "Guitar",
            StemKind::Piano => "Piano",
        }
    }

    /// Three-letter label for the spawn dock.
    pub fn short_label(self) -> &'static str {
        &self.key()[..3]
    }

    pub fn color_rgb(self) -> [f32; 3] {
        DEFAULT_STEM_COLORS[self.index()]
    }

    pub fn default_position(self) -> Vec3 {
        default_position(self.index())
    }

    pub fn default_archetype(self) -> Archetype {
        match self {
            StemKind::Drums => Archetype::Orb,
            StemKind::Bass => Archetype::Ring,
            StemKind::Vocals => Archetype::Knot,
            StemKind::Guitar => Archetype::ShardCluster,
            StemKind::Piano => Archetype::StackedBar,
        }
    }
}

impl fmt::Display for StemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for StemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drums" | "drum" => Ok(StemKind::Drums),
            "bass" => Ok(StemKind::Bass),
            "vocals" | "vocal" => Ok(StemKind::Vocals),
            "guitar" => Ok(StemKind::Guitar),
            "piano" => Ok(StemKind::Piano),
            other => Err(format!("unknown stem '{other}'")),
        }
    }
}

/// Raw JSON body returned by the separation backend.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SeparationResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub stems: HashMap<String, Option<String>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, rename = "isDemo")]
    pub is_demo: bool,
    #[serde(default)]
    pub cached: bool,
}

impl SeparationResponse {
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        serde_json::from_str(json).map_err(|e| SessionError::InvalidResponse(e.to_string()))
    }

    /// The usable stems, or the backend's reason for failing.
    pub fn into_stems(self) -> Result<StemSet, SessionError> {
        if !self.success {
            let reason = self.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(SessionError::Backend(reason));
        }
        let mut urls = BTreeMap::new();
        for (name, url) in self.stems {
            let stem = match name.parse::<StemKind>() {
                Ok(stem) => stem,
                Err(e) => {
                    log::warn!("ignoring stem from backend: {e}");
                    continue;
                }
            };
            if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
                urls.insert(stem, url);
            }
        }
        Ok(StemSet {
            urls,
            is_demo: self.is_demo,
            cached: self.cached,
        })
    }
}

/// Stems that are present for the current track. Missing stems are simply absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StemSet {
    urls: BTreeMap<StemKind, String>,
    pub is_demo: bool,
    pub cached: bool,
}

impl StemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by hosts and tests. Empty urls are dropped.
    pub fn with(mut self, stem: StemKind, url: impl Into<String>) -> Self {
        let url = url.into();
        if !url.trim().is_empty() {
            self.urls.insert(stem, url);
        }
        self
    }

    pub fn url(&self, stem: StemKind) -> Option<&str> {
        self.urls.get(&stem).map(String::as_str)
    }

    pub fn contains(&self, stem: StemKind) -> bool {
        self.urls.contains_key(&stem)
    }

    /// Every asset url in the set, in stem order.
    pub fn urls(&self) -> impl Iterator<Item = &str> + '_ {
        self.urls.values().map(String::as_str)
    }

    /// Drop cached assets keyed by a url this set no longer uses.
    /// Returns how many entries were evicted.
    pub fn prune_cache<V>(&self, cache: &mut HashMap<String, V>) -> usize {
        let before = cache.len();
        cache.retain(|url, _| self.urls.values().any(|u| u == url));
        before - cache.len()
    }

    /// Present stems in canonical order.
    pub fn kinds(&self) -> impl Iterator<Item = StemKind> + '_ {
        self.urls.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Which archetype each stem is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct VisualMapping {
    map: BTreeMap<StemKind, Archetype>,
}

impl Default for VisualMapping {
    fn default() -> Self {
        Self {
            map: ALL_STEMS
                .iter()
                .map(|s| (*s, s.default_archetype()))
                .collect(),
        }
    }
}

impl VisualMapping {
    pub fn empty() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn get(&self, stem: StemKind) -> Archetype {
        self.map
            .get(&stem)
            .copied()
            .unwrap_or_else(|| stem.default_archetype())
    }

    pub fn set(&mut self, stem: StemKind, archetype: Archetype) {
        self.map.insert(stem, archetype);
    }

    /// Give every stem in `stems` an archetype, keeping existing choices.
    pub fn ensure_for_stems(&mut self, stems: impl IntoIterator<Item = StemKind>) {
        for stem in stems {
            self.map.entry(stem).or_insert_with(|| stem.default_archetype());
        }
    }

    pub fn contains(&self, stem: StemKind) -> bool {
        self.map.contains_key(&stem)
    }
}
