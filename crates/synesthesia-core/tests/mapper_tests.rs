// Host-side tests for the per-archetype parameter mappers.

use synesthesia_core::{
    energy_from_db, Archetype, MapInput, OrbTuning, ALL_ARCHETYPES, BAR_COUNT, SHARD_COUNT,
};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn orb_scale_from_minus_twenty_db() {
    let energy = energy_from_db(-20.0) as f32;
    let tuning = OrbTuning {
        k1: 2.0,
        k2: 1.0,
        ..OrbTuning::default()
    };
    let t = Archetype::Orb.targets_with(&MapInput::new(energy, 0.0, 1.0, 1.0), &tuning);
    assert!(approx(t.scale, 2.1), "got {}", t.scale);
}

#[test]
fn orb_goes_hot_above_threshold() {
    let cool = Archetype::Orb.targets(&MapInput::new(0.3, 0.0, 1.0, 1.0));
    let hot = Archetype::Orb.targets(&MapInput::new(0.5, 0.0, 1.0, 1.0));
    assert_eq!(cool.color_blend, 0.0);
    assert_eq!(hot.color_blend, 1.0);
    assert!(approx(hot.distortion, 0.3 + 0.5 * 4.0));
}

#[test]
fn ring_motion_tracks_playback_rate() {
    let slow = Archetype::Ring.targets(&MapInput::new(0.2, 1.0, 1.0, 0.5));
    let fast = Archetype::Ring.targets(&MapInput::new(0.2, 1.0, 1.0, 2.0));
    assert!(approx(fast.rotation_rate.z, slow.rotation_rate.z * 4.0));
    assert!(approx(fast.phase_rate, slow.phase_rate * 4.0));
    assert!(approx(slow.displacement, 0.2 + 0.2 * 4.0));
}

#[test]
fn knot_bobs_without_energy() {
    let a = Archetype::Knot.targets(&MapInput::new(0.0, 1.0, 1.0, 1.0));
    let b = Archetype::Knot.targets(&MapInput::new(0.0, 3.0, 1.0, 1.0));
    assert!(a.bob != b.bob);
    let loud = Archetype::Knot.targets(&MapInput::new(1.0, 1.0, 1.0, 1.0));
    assert_eq!(a.bob, loud.bob);
    assert!(loud.scale > a.scale);
}

#[test]
fn shards_spread_with_energy() {
    let quiet = Archetype::ShardCluster.targets(&MapInput::new(0.0, 0.0, 1.0, 1.0));
    let loud = Archetype::ShardCluster.targets(&MapInput::new(1.0, 0.0, 1.0, 1.0));
    assert_eq!(quiet.children.len(), SHARD_COUNT);
    assert!(approx(quiet.children[0], -1.5));
    assert!(approx(quiet.children[1], 0.0));
    assert!(approx(loud.children[2], 1.5 * 4.0));
    assert!(loud.emissive > quiet.emissive);
}

#[test]
fn bars_have_one_child_each() {
    let t = Archetype::StackedBar.targets(&MapInput::new(0.5, 2.0, 1.0, 1.0));
    assert_eq!(t.children.len(), BAR_COUNT);
    assert!(approx(t.emissive, 1.0 + 0.5 * 5.0));
}

#[test]
fn mappers_are_deterministic() {
    let input = MapInput::new(0.37, 4.2, 1.3, 0.8);
    for a in ALL_ARCHETYPES {
        assert_eq!(a.targets(&input), a.targets(&input));
        assert_eq!(a.idle_targets(4.2, 1.3, 0.8), a.idle_targets(4.2, 1.3, 0.8));
    }
}

#[test]
fn idle_motion_is_never_static() {
    for a in ALL_ARCHETYPES {
        let t0 = a.idle_targets(0.3, 1.0, 1.0);
        let t1 = a.idle_targets(1.1, 1.0, 1.0);
        assert!(t0 != t1, "{a} idle targets do not change over time");
    }
}

#[test]
fn bad_inputs_fall_back_to_neutral() {
    for a in ALL_ARCHETYPES {
        let bad = a.targets(&MapInput::new(f32::NAN, f32::INFINITY, -1.0, 0.0));
        let neutral = a.targets(&MapInput::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(bad, neutral, "{a}");
        assert!(bad.scale.is_finite());
    }
}

#[test]
fn archetype_names_parse() {
    assert_eq!("orb".parse::<Archetype>().unwrap(), Archetype::Orb);
    assert_eq!("Terrain".parse::<Archetype>().unwrap(), Archetype::Ring);
    assert_eq!("Cloud".parse::<Archetype>().unwrap(), Archetype::Knot);
    assert!("teapot".parse::<Archetype>().is_err());
    for a in ALL_ARCHETYPES {
        assert_eq!(a.name().parse::<Archetype>().unwrap(), a);
    }
}
