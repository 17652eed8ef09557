// Host-side tests for level sampling.

mod common;

use common::FixedMeter;
use synesthesia_core::{db_to_gain, energy_from_db, sample, sample_energy, ChannelId, PlaybackStatus};

#[test]
fn out_of_range_readings_give_zero_energy() {
    for db in [-100.0_f64, -120.0, -1e6, 100.0, 150.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
        assert_eq!(energy_from_db(db), 0.0, "db {db} should be rejected");
        let meter = FixedMeter(Some(db));
        assert_eq!(sample_energy(Some(&meter), PlaybackStatus::Playing), 0.0);
    }
}

#[test]
fn sampled_energy_matches_db_to_gain_across_the_range() {
    let id = ChannelId::from("bass-0");
    let mut db = -99.75_f64;
    while db < 100.0 {
        let expected = 10f64.powf(db / 20.0);
        let meter = FixedMeter(Some(db));

        let e = sample_energy(Some(&meter), PlaybackStatus::Playing);
        assert!((e - expected).abs() < 1e-9, "db {db}: got {e}, expected {expected}");

        let s = sample(&id, Some(&meter), PlaybackStatus::Playing);
        assert!((s.linear_energy - expected).abs() < 1e-9, "db {db}: got {}", s.linear_energy);
        db += 0.25;
    }
}

#[test]
fn readings_between_grid_points_keep_full_precision() {
    // Values that do not survive a round trip through f32.
    for db in [-37.123456789_f64, -0.000000123, 12.3456789012, 99.999999] {
        let meter = FixedMeter(Some(db));
        let e = sample_energy(Some(&meter), PlaybackStatus::Playing);
        assert!((e - 10f64.powf(db / 20.0)).abs() < 1e-9, "db {db}");
    }
}

#[test]
fn minus_twenty_db_is_a_tenth() {
    assert!((db_to_gain(-20.0) - 0.1).abs() < 1e-12);
    assert!((energy_from_db(-20.0) - 0.1).abs() < 1e-9);
}

#[test]
fn peaks_above_zero_db_are_not_clamped() {
    let e = energy_from_db(6.0);
    assert!(e > 1.9 && e < 2.0);
}

#[test]
fn idle_status_reads_nothing() {
    let meter = FixedMeter(Some(-6.0));
    assert_eq!(sample_energy(Some(&meter), PlaybackStatus::Idle), 0.0);
    assert!(sample_energy(Some(&meter), PlaybackStatus::Playing) > 0.4);
}

#[test]
fn missing_meter_or_reading_degrades_to_zero() {
    assert_eq!(sample_energy::<FixedMeter>(None, PlaybackStatus::Playing), 0.0);
    let silent = FixedMeter(None);
    assert_eq!(sample_energy(Some(&silent), PlaybackStatus::Playing), 0.0);
}

#[test]
fn sample_keeps_raw_reading() {
    let id = ChannelId::from("drums-0");
    let meter = FixedMeter(Some(-20.0));
    let s = sample(&id, Some(&meter), PlaybackStatus::Playing);
    assert_eq!(s.channel_id, &id);
    assert_eq!(s.db, -20.0);
    assert!((s.linear_energy - 0.1).abs() < 1e-9);

    let idle = sample(&id, Some(&meter), PlaybackStatus::Idle);
    assert_eq!(idle.linear_energy, 0.0);
    assert_eq!(idle.db, f64::NEG_INFINITY);
}
