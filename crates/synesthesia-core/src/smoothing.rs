//! Exponential smoothing toward per-frame targets.

/// `current + (target - current) * alpha`.
#[inline]
pub fn lerp(current: f32, target: f32, alpha: f32) -> f32 {
    current + (target - current) * alpha
}

/// Clamp an alpha into (0, 1]. Non-finite or non-positive alphas snap.
#[inline]
pub fn sanitize_alpha(alpha: f32) -> f32 {
    if alpha.is_finite() && alpha > 0.0 {
        alpha.min(1.0)
    } else {
        1.0
    }
}

/// A single smoothed scalar that keeps its last good value when fed garbage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Smoothed {
    value: f32,
}

impl Smoothed {
    pub const fn new(value: f32) -> Self {
        Self { value }
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value
    }

    /// Jump straight to `value` (ignored if non-finite).
    #[inline]
    pub fn set(&mut self, value: f32) {
        if value.is_finite() {
            self.value = value;
        }
    }

    /// Move one step toward `target`.
    #[inline]
    pub fn step(&mut self, target: f32, alpha: f32) -> f32 {
        if target.is_finite() {
            let next = lerp(self.value, target, sanitize_alpha(alpha));
            if next.is_finite() {
                self.value = next;
            }
        }
        self.value
    }
}

impl Default for Smoothed {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Per-parameter alphas for one archetype. Larger is snappier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingProfile {
    pub scale: f32,
    pub color: f32,
    pub emissive: f32,
    pub distortion: f32,
    pub displacement: f32,
    pub children: f32,
}

impl SmoothingProfile {
    pub const fn uniform(alpha: f32) -> Self {
        Self {
            scale: alpha,
            color: alpha,
            emissive: alpha,
            distortion: alpha,
            displacement: alpha,
            children: alpha,
        }
    }
}

impl Default for SmoothingProfile {
    fn default() -> Self {
        Self::uniform(0.1)
    }
}
