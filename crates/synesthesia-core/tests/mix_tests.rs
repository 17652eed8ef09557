// Host-side tests for the mix controller.

mod common;

use common::FakeGraph;
use glam::Vec3;
use synesthesia_core::{ChannelId, ChannelRegistry, EngineConfig, MixController};

fn controller() -> MixController {
    MixController::new(&EngineConfig::default())
}

#[test]
fn pan_clamps_at_the_edges() {
    let mix = controller();
    assert_eq!(mix.pan_for(8.0), 1.0);
    assert_eq!(mix.pan_for(20.0), 1.0);
    assert_eq!(mix.pan_for(-20.0), -1.0);
    assert_eq!(mix.pan_for(4.0), 0.5);
    assert_eq!(mix.pan_for(f32::NAN), 0.0);
}

#[test]
fn gain_never_boosts() {
    let mix = controller();
    assert_eq!(mix.gain_db_for(3.0), 0.0);
    assert_eq!(mix.gain_db_for(0.0), 0.0);
    assert_eq!(mix.gain_db_for(-2.0), -4.0);
}

#[test]
fn rate_is_inverse_of_scale() {
    let mut mix = controller();
    assert_eq!(mix.rate_for(2.0), 0.5);
    assert_eq!(mix.rate_for(0.5), 2.0);
    assert_eq!(mix.rate_for(0.0), 1.0);

    let base = mix.base_bpm;
    mix.set_global_bpm(base * 1.5);
    assert!((mix.rate_for(2.0) - 0.75).abs() < 1e-6);
    mix.set_global_bpm(-10.0);
    assert!((mix.tempo_factor() - 1.5).abs() < 1e-6, "invalid bpm ignored");
}

#[test]
fn recompute_is_idempotent() {
    let mix = controller();
    let p = Vec3::new(3.0, 1.0, -1.5);
    let a = mix.compute(p, 1.25);
    let b = mix.compute(p, 1.25);
    assert_eq!(a, b);
}

#[test]
fn apply_only_writes_changed_fields() {
    let (graph, ledger) = FakeGraph::new();
    let mut registry = ChannelRegistry::new(graph);
    let id = ChannelId::from("drums-0");
    registry.load_track(id.clone(), "a.wav").unwrap();
    let mix = controller();

    let channel = registry.get_mut(&id).unwrap();
    let first = mix.update(channel, Vec3::new(2.0, 0.0, 0.0), 1.0);
    {
        let l = ledger.borrow();
        assert_eq!((l.pan_writes, l.gain_writes, l.rate_writes), (1, 1, 1));
    }

    let channel = registry.get_mut(&id).unwrap();
    let second = mix.update(channel, Vec3::new(2.0, 0.0, 0.0), 1.0);
    assert_eq!(first, second);
    {
        let l = ledger.borrow();
        assert_eq!((l.pan_writes, l.gain_writes, l.rate_writes), (1, 1, 1));
    }

    let channel = registry.get_mut(&id).unwrap();
    let changes = mix.apply(channel, mix.compute(Vec3::new(-4.0, 0.0, 0.0), 1.0));
    assert!(changes.pan && !changes.gain && !changes.rate);
    let channel = registry.get(&id).unwrap();
    assert_eq!(channel.applied_mix().unwrap().pan, -0.5);
}
