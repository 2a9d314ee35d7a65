use crate::foundation::core::Point;

/// Deterministic SplitMix64 generator used by shape generators and demo scenes.
#[derive(Clone, Copy, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        // SplitMix64
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_f64_01(&mut self) -> f64 {
        // 53 bits of precision.
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }

    /// Uniform value in `[min, max)`; swapped bounds are accepted.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        lo + (hi - lo) * self.next_f64_01()
    }
}

pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Normalized `[0, 1]` falloff ratio of `dist` against `limit` (0 = touching, 1 = at or past the
/// limit). A non-positive limit is always "far".
pub fn ratio(dist: f64, limit: f64) -> f64 {
    if limit.is_nan() || limit <= 0.0 || !dist.is_finite() {
        return 1.0;
    }
    (dist / limit).clamp(0.0, 1.0)
}

/// Value that decreases from `max` (ratio 0) down to `max - range` (ratio 1).
pub fn falloff(max: f64, ratio: f64, range: f64) -> f64 {
    max - ratio.clamp(0.0, 1.0) * range
}

/// Ping-pong helper for looping animations: even cycles go `min -> max`, odd cycles come back.
pub fn fade(progress: f64, play_count: u32, min: f64, max: f64) -> f64 {
    let span = max - min;
    if play_count % 2 == 1 {
        min + span * (1.0 - progress)
    } else {
        min + span * progress
    }
}

/// Degrees normalized into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}
