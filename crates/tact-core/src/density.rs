//! Live dot density (raised dots under the reading point) to haptic parameters.
//!
//! All three mappings clamp the count into 0..=6 first, so they are monotone
//! non-decreasing and bounded.

use crate::constants::MAX_DENSITY;

/// Clamp a raw density observation into 0..=6.
pub fn clamp_density(dot_count: i32) -> i32 {
    dot_count.clamp(0, MAX_DENSITY)
}

/// Tick intensity: 0.15 + 0.12n, in [0.15, 0.87].
pub fn tick_intensity(dot_count: i32) -> f64 {
    0.15 + 0.12 * clamp_density(dot_count) as f64
}

/// Bed intensity: 0.05 + 0.10n, in [0.05, 0.65].
pub fn bed_intensity(dot_count: i32) -> f64 {
    0.05 + 0.10 * clamp_density(dot_count) as f64
}

/// Bed sharpness: 0.20 + 0.10n, in [0.20, 0.80].
pub fn bed_sharpness(dot_count: i32) -> f64 {
    0.20 + 0.10 * clamp_density(dot_count) as f64
}

pub(crate) fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}
