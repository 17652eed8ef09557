// Shared fake audio graph for host-side tests.
// Handles record every call so tests can assert on leaks and redundant writes.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use synesthesia_core::{AudioError, AudioGraph, ChannelId, MeterHandle, PlaybackHandle};

#[derive(Default, Debug)]
pub struct Ledger {
    pub live_players: usize,
    pub live_meters: usize,
    pub created: Vec<String>,
    pub started: Vec<(String, f64)>,
    pub pan_writes: usize,
    pub gain_writes: usize,
    pub rate_writes: usize,
    /// Meter readings by channel id.
    pub levels: std::collections::HashMap<String, f64>,
    /// Urls that fail to create.
    pub broken_urls: Vec<String>,
}

pub type SharedLedger = Rc<RefCell<Ledger>>;

pub struct FakeGraph {
    pub ledger: SharedLedger,
    pub now: f64,
}

impl FakeGraph {
    pub fn new() -> (Self, SharedLedger) {
        let ledger = SharedLedger::default();
        (
            Self {
                ledger: ledger.clone(),
                now: 10.0,
            },
            ledger,
        )
    }
}

pub struct FakePlayer {
    pub id: String,
    pub ledger: SharedLedger,
    pub pan: f32,
    pub gain_db: f32,
    pub rate: f32,
    pub playing: bool,
    disposed: bool,
}

pub struct FakeMeter {
    pub id: String,
    pub ledger: SharedLedger,
    disposed: bool,
}

impl AudioGraph for FakeGraph {
    type Player = FakePlayer;
    type Meter = FakeMeter;

    fn create_pair(
        &mut self,
        id: &ChannelId,
        source_url: &str,
    ) -> Result<(FakePlayer, FakeMeter), AudioError> {
        let mut l = self.ledger.borrow_mut();
        if l.broken_urls.iter().any(|u| u == source_url) {
            return Err(AudioError::PlayerCreation {
                channel: id.to_string(),
                reason: "broken".into(),
            });
        }
        l.live_players += 1;
        l.live_meters += 1;
        l.created.push(id.to_string());
        Ok((
            FakePlayer {
                id: id.to_string(),
                ledger: self.ledger.clone(),
                pan: 0.0,
                gain_db: 0.0,
                rate: 1.0,
                playing: false,
                disposed: false,
            },
            FakeMeter {
                id: id.to_string(),
                ledger: self.ledger.clone(),
                disposed: false,
            },
        ))
    }

    fn current_time(&self) -> f64 {
        self.now
    }
}

impl PlaybackHandle for FakePlayer {
    fn start_at(&mut self, when: f64) {
        self.playing = true;
        self.ledger.borrow_mut().started.push((self.id.clone(), when));
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn set_pan(&mut self, pan: f32) {
        self.pan = pan;
        self.ledger.borrow_mut().pan_writes += 1;
    }

    fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db;
        self.ledger.borrow_mut().gain_writes += 1;
    }

    fn set_playback_rate(&mut self, rate: f32) {
        self.rate = rate;
        self.ledger.borrow_mut().rate_writes += 1;
    }

    fn dispose(&mut self) {
        assert!(!self.disposed, "player {} disposed twice", self.id);
        self.disposed = true;
        self.ledger.borrow_mut().live_players -= 1;
    }
}

impl MeterHandle for FakeMeter {
    fn read_db(&self) -> Option<f64> {
        self.ledger.borrow().levels.get(&self.id).copied()
    }

    fn dispose(&mut self) {
        assert!(!self.disposed, "meter {} disposed twice", self.id);
        let mut l = self.ledger.borrow_mut();
        assert!(
            l.live_players > 0,
            "meter {} outlived every player",
            self.id
        );
        self.disposed = true;
        l.live_meters -= 1;
    }
}

pub fn set_level(ledger: &SharedLedger, id: &str, db: f64) {
    ledger.borrow_mut().levels.insert(id.to_string(), db);
}

/// Simple meter that reports a fixed reading.
pub struct FixedMeter(pub Option<f64>);

impl MeterHandle for FixedMeter {
    fn read_db(&self) -> Option<f64> {
        self.0
    }

    fn dispose(&mut self) {}
}
