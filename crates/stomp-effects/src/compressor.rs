//! Dynamics compressor with makeup gain.
//!
//! ```text
//! input → compressor → makeup → output
//! ```
//!
//! | control     | node value                      |
//! |-------------|---------------------------------|
//! | `threshold` | `map(v, −50, −10)` dB           |
//! | `ratio`     | `map(v, 1, 20)`                 |
//! | `attack`    | `map(exp(v), 0.001, 0.5)` s     |
//! | `release`   | `map(exp(v), 0.01, 1.0)` s      |
//! | `volume`    | makeup gain `map(v, 0, 4)`      |

use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage, exp_scale, map_to_min_max,
};

/// Threshold knob.
pub const THRESHOLD: ParamSpec = ParamSpec::unit("threshold", 0.5);
/// Ratio knob.
pub const RATIO: ParamSpec = ParamSpec::unit("ratio", 0.2);
/// Attack knob.
pub const ATTACK: ParamSpec = ParamSpec::unit("attack", 0.1);
/// Release knob.
pub const RELEASE: ParamSpec = ParamSpec::unit("release", 0.5);
/// Makeup gain knob.
pub const VOLUME: ParamSpec = ParamSpec::unit("volume", 0.25);

static PARAMS: [ParamSpec; 5] = [THRESHOLD, RATIO, ATTACK, RELEASE, VOLUME];

/// Compressor pedal.
#[derive(Debug)]
pub struct Compressor {
    core: EffectCore,
    compressor: NodeId,
    makeup: NodeId,
}

impl Compressor {
    /// Model name.
    pub const MODEL: &'static str = "compressor";

    /// Create a compressor with default settings.
    pub fn new(ctx: &AudioContext) -> Self {
        let compressor = ctx.create_compressor();
        let makeup = ctx.create_gain(1.0);
        let stages = vec![Stage::node(compressor), Stage::node(makeup)];
        let mut fx = Self {
            core: EffectCore::new(ctx, Self::MODEL, stages),
            compressor,
            makeup,
        };
        fx.set_threshold(THRESHOLD.default);
        fx.set_ratio(RATIO.default);
        fx.set_attack(ATTACK.default);
        fx.set_release(RELEASE.default);
        fx.set_volume(VOLUME.default);
        fx
    }

    /// Set the threshold.
    pub fn set_threshold(&mut self, v: f32) {
        if let Some(v) = self.core.set(&THRESHOLD, v) {
            self.core.ramp(
                self.compressor,
                ParamKind::Threshold,
                map_to_min_max(v, -50.0, -10.0),
            );
        }
    }

    /// Set the ratio.
    pub fn set_ratio(&mut self, v: f32) {
        if let Some(v) = self.core.set(&RATIO, v) {
            self.core
                .ramp(self.compressor, ParamKind::Ratio, map_to_min_max(v, 1.0, 20.0));
        }
    }

    /// Set the attack time.
    pub fn set_attack(&mut self, v: f32) {
        if let Some(v) = self.core.set(&ATTACK, v) {
            let seconds = map_to_min_max(exp_scale(v), 0.001, 0.5);
            self.core.ramp(self.compressor, ParamKind::Attack, seconds);
        }
    }

    /// Set the release time.
    pub fn set_release(&mut self, v: f32) {
        if let Some(v) = self.core.set(&RELEASE, v) {
            let seconds = map_to_min_max(exp_scale(v), 0.01, 1.0);
            self.core.ramp(self.compressor, ParamKind::Release, seconds);
        }
    }

    /// Set the makeup gain.
    pub fn set_volume(&mut self, v: f32) {
        if let Some(v) = self.core.set(&VOLUME, v) {
            self.core
                .ramp(self.makeup, ParamKind::Gain, map_to_min_max(v, 0.0, 4.0));
        }
    }

    /// Current gain reduction in dB.
    pub fn reduction(&self) -> f32 {
        self.core
            .ctx()
            .compressor_reduction(self.compressor)
            .unwrap_or(0.0)
    }
}

impl Effect for Compressor {
    fn core(&self) -> &EffectCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        &mut self.core
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        &PARAMS
    }

    fn apply_param(&mut self, name: &str, value: &ParamValue) -> bool {
        match (name, value.as_number()) {
            ("threshold", Some(v)) => self.set_threshold(v),
            ("ratio", Some(v)) => self.set_ratio(v),
            ("attack", Some(v)) => self.set_attack(v),
            ("release", Some(v)) => self.set_release(v),
            ("volume", Some(v)) => self.set_volume(v),
            _ => return false,
        }
        true
    }
}
