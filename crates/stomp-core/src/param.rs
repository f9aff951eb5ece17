//! Parameter ranges and smoothing.
//!
//! Controls in the rig live in two worlds. On the UI side they are normalized
//! knob values described by a [`ParamSpec`]; every write is clamped into the
//! spec's range before anything else happens. On the audio side they become
//! [`AudioParam`]s on graph nodes, which never jump: a new target is
//! approached exponentially with a fixed time constant
//! ([`RAMP_TIME_CONSTANT_MS`]) by a [`SmoothedParam`].
//!
//! ```rust
//! use stomp_core::SmoothedParam;
//!
//! let mut gain = SmoothedParam::with_config(1.0, 48000.0, 10.0);
//! gain.set_target(0.5);
//!
//! // 10 ms at 48 kHz is one time constant: ~63% of the way there.
//! for _ in 0..480 {
//!     gain.advance();
//! }
//! assert!((gain.get() - (1.0 - 0.5 * 0.632)).abs() < 0.01);
//! ```

use crate::math::clamp;
use libm::expf;

/// Time constant, in milliseconds, of every parameter ramp.
pub const RAMP_TIME_CONSTANT_MS: f32 = 10.0;

/// Documented range of one normalized control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Control name as it appears in snapshots.
    pub name: &'static str,
    /// Smallest accepted value.
    pub min: f32,
    /// Largest accepted value.
    pub max: f32,
    /// Value applied when an effect is created.
    pub default: f32,
}

impl ParamSpec {
    /// A control on the usual `[0, 1]` domain.
    pub const fn unit(name: &'static str, default: f32) -> Self {
        Self {
            name,
            min: 0.0,
            max: 1.0,
            default,
        }
    }

    /// A control with an effect-specific range.
    pub const fn ranged(name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            min,
            max,
            default,
        }
    }

    /// Clamp `value` into this control's range.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        clamp(value, self.min, self.max)
    }
}

/// A value with one-pole exponential smoothing.
///
/// `coeff = 1 - exp(-1 / (tau * sample_rate))`; after one time constant the
/// value has covered 63.2% of the distance to its target.
#[derive(Debug, Clone)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
    sample_rate: f32,
    smoothing_time_ms: f32,
}

impl SmoothedParam {
    /// Create an unsmoothed parameter (changes apply instantly).
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: 1.0,
            sample_rate: 48000.0,
            smoothing_time_ms: 0.0,
        }
    }

    /// Create a smoothed parameter with full configuration.
    pub fn with_config(initial: f32, sample_rate: f32, smoothing_time_ms: f32) -> Self {
        let mut param = Self::new(initial);
        param.sample_rate = sample_rate;
        param.smoothing_time_ms = smoothing_time_ms;
        param.recalculate_coeff();
        param
    }

    /// Parameter with the rig's standard ramp time constant.
    pub fn ramped(initial: f32, sample_rate: f32) -> Self {
        Self::with_config(initial, sample_rate, RAMP_TIME_CONSTANT_MS)
    }

    /// Set the value to approach.
    #[inline]
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Jump straight to `value`.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.target = value;
        self.current = value;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Set the smoothing time constant in milliseconds.
    pub fn set_smoothing_time_ms(&mut self, time_ms: f32) {
        self.smoothing_time_ms = time_ms;
        self.recalculate_coeff();
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Current value without advancing.
    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    /// Target value.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Whether the value has reached its target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.current - self.target).abs() < 1e-6
    }

    /// Skip the remaining ramp.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
    }

    fn recalculate_coeff(&mut self) {
        if self.smoothing_time_ms <= 0.0 || self.sample_rate <= 0.0 {
            self.coeff = 1.0;
        } else {
            let samples = self.smoothing_time_ms / 1000.0 * self.sample_rate;
            self.coeff = 1.0 - expf(-1.0 / samples);
        }
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// A node-level audio parameter.
///
/// Holds a smoothed intrinsic value and a nominal range. During rendering the
/// intrinsic value is advanced per sample and any modulation signal connected
/// to the parameter is added on top; the sum is clamped to the nominal range.
#[derive(Debug, Clone)]
pub struct AudioParam {
    value: SmoothedParam,
    min: f32,
    max: f32,
}

impl AudioParam {
    /// Create a parameter at `initial` with the standard ramp.
    pub fn new(initial: f32, min: f32, max: f32, sample_rate: f32) -> Self {
        Self {
            value: SmoothedParam::ramped(clamp(initial, min, max), sample_rate),
            min,
            max,
        }
    }

    /// Jump to `value` (clamped to the nominal range).
    pub fn set_value(&mut self, value: f32) {
        self.value.set_immediate(clamp(value, self.min, self.max));
    }

    /// Approach `target` exponentially with the standard time constant.
    pub fn set_target(&mut self, target: f32) {
        self.value.set_target(clamp(target, self.min, self.max));
    }

    /// The value being approached.
    pub fn target(&self) -> f32 {
        self.value.target()
    }

    /// The current intrinsic value.
    pub fn value(&self) -> f32 {
        self.value.get()
    }

    /// Advance one sample without modulation.
    #[inline]
    pub fn next(&mut self) -> f32 {
        self.value.advance()
    }

    /// Fill `out` with per-sample values, adding `modulation` when present.
    pub fn fill(&mut self, modulation: Option<&[f32]>, out: &mut [f32]) {
        match modulation {
            Some(modulation) => {
                for (o, m) in out.iter_mut().zip(modulation) {
                    *o = clamp(self.value.advance() + m, self.min, self.max);
                }
            }
            None => {
                for o in out.iter_mut() {
                    *o = self.value.advance();
                }
            }
        }
    }
}
