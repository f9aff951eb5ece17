//! Mathematical utility functions for control mapping and DSP.
//!
//! Every normalized control in the rig goes through the same small set of
//! helpers before it reaches an audio node:
//!
//! - [`clamp`] - pin a control into its documented range
//! - [`map_to_min_max`] - linear map of a normalized value onto `[min, max]`
//! - [`exp_scale`] - squared response for perceptually even sweeps
//!
//! Wet/dry balance uses one of two cross-fade laws:
//!
//! | Function | Law | Used by |
//! |----------|-----|---------|
//! | [`linear_cross_fade`] | `(1 - x, x)` | delay, phaser |
//! | [`equal_cross_fade`] | `(cos(xπ/2), cos((1 - x)π/2))` | reverb |

use core::f32::consts::FRAC_PI_2;
use libm::{cosf, expf, logf};

/// Clamp a value to a range.
///
/// # Example
/// ```rust
/// use stomp_core::clamp;
///
/// assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
/// assert_eq!(clamp(-0.2, 0.0, 1.0), 0.0);
/// ```
#[inline]
pub fn clamp(x: f32, min: f32, max: f32) -> f32 {
    if x.is_nan() {
        return min;
    }
    x.clamp(min, max)
}

/// Linearly map a normalized value onto `[min, max]`.
///
/// `value * (max - min) + min`. The value is not clamped; callers clamp first.
///
/// # Example
/// ```rust
/// use stomp_core::map_to_min_max;
///
/// assert_eq!(map_to_min_max(0.5, -50.0, -10.0), -30.0);
/// ```
#[inline]
pub fn map_to_min_max(value: f32, min: f32, max: f32) -> f32 {
    value * (max - min) + min
}

/// Squared response curve, `|value|²`.
///
/// Composed with [`map_to_min_max`] it spends more of the knob travel on the
/// low end of a frequency or time range.
#[inline]
pub fn exp_scale(value: f32) -> f32 {
    let v = value.abs();
    v * v
}

/// Linear cross-fade gains `(dry, wet) = (1 - x, x)`.
#[inline]
pub fn linear_cross_fade(x: f32) -> (f32, f32) {
    (1.0 - x, x)
}

/// Equal-power cross-fade gains `(cos(xπ/2), cos((1 - x)π/2))`.
///
/// The endpoints are returned exactly so neither side collapses to a tiny
/// non-zero residue at full dry or full wet.
#[inline]
pub fn equal_cross_fade(x: f32) -> (f32, f32) {
    if x <= 0.0 {
        return (1.0, 0.0);
    }
    if x >= 1.0 {
        return (0.0, 1.0);
    }
    (cosf(x * FRAC_PI_2), cosf((1.0 - x) * FRAC_PI_2))
}

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use stomp_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Silence maps to -100 dB.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 1e-5 {
        return -100.0;
    }
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear) * FACTOR
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Flush values below 1e-20 to zero.
///
/// Used in feedback paths (IIR state, delay loops) where a decaying signal
/// would otherwise drift into the subnormal range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
