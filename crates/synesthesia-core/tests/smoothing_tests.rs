// Host-side tests for the smoothing layer.

use synesthesia_core::{lerp, sanitize_alpha, Archetype, Smoothed, ALL_ARCHETYPES};

#[test]
fn lerp_endpoints() {
    assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
    assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
    assert_eq!(lerp(2.0, 6.0, 0.25), 3.0);
}

#[test]
fn convergence_is_monotonic() {
    let alphas = [0.05_f32, 0.1, 0.3, 0.4, 0.75, 1.0];
    let targets = [-3.0_f32, 0.0, 0.5, 2.1, 10.0];
    for &alpha in &alphas {
        for &target in &targets {
            let mut s = Smoothed::new(4.0);
            let mut prev = (s.get() - target).abs();
            for _ in 0..200 {
                s.step(target, alpha);
                let d = (s.get() - target).abs();
                assert!(d <= prev + 1e-6, "alpha {alpha} target {target}: {d} > {prev}");
                prev = d;
            }
        }
    }
}

#[test]
fn alpha_one_snaps() {
    let mut s = Smoothed::new(0.0);
    s.step(5.0, 1.0);
    assert_eq!(s.get(), 5.0);
}

#[test]
fn invalid_alpha_is_sanitized() {
    assert_eq!(sanitize_alpha(0.0), 1.0);
    assert_eq!(sanitize_alpha(-0.5), 1.0);
    assert_eq!(sanitize_alpha(f32::NAN), 1.0);
    assert_eq!(sanitize_alpha(3.0), 1.0);
    assert_eq!(sanitize_alpha(0.2), 0.2);
}

#[test]
fn non_finite_target_keeps_last_good_value() {
    let mut s = Smoothed::new(1.5);
    s.step(f32::NAN, 0.5);
    assert_eq!(s.get(), 1.5);
    s.step(f32::INFINITY, 0.5);
    assert_eq!(s.get(), 1.5);
    s.set(f32::NAN);
    assert_eq!(s.get(), 1.5);
}

#[test]
fn archetype_alphas_are_in_range() {
    for a in ALL_ARCHETYPES {
        let p = a.smoothing();
        for alpha in [p.scale, p.color, p.emissive, p.distortion, p.displacement, p.children] {
            assert!(alpha > 0.0 && alpha <= 1.0, "{a}: {alpha}");
        }
    }
    // Percussive visuals respond faster than sustained ones.
    assert!(Archetype::Orb.smoothing().scale > Archetype::Knot.smoothing().scale);
}
