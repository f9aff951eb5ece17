//! Amplitude tremolo.
//!
//! ```text
//! input → vca → output
//!          ▲ gain
//! lfo → depth
//! ```
//!
//! The VCA sits at `1 − d/2` and the LFO swings it by `±d/2`, so the gain
//! stays within `[1 − d, 1]`.

use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage, Waveform, exp_scale,
    map_to_min_max,
};

/// LFO rate, `map(exp(v), 1, 15)` Hz.
pub const SPEED: ParamSpec = ParamSpec::unit("speed", 0.5);
/// Modulation depth.
pub const DEPTH: ParamSpec = ParamSpec::unit("depth", 0.5);

static PARAMS: [ParamSpec; 2] = [SPEED, DEPTH];

/// Tremolo pedal.
#[derive(Debug)]
pub struct Tremolo {
    core: EffectCore,
    vca: NodeId,
    lfo: NodeId,
    depth: NodeId,
}

impl Tremolo {
    /// Model name.
    pub const MODEL: &'static str = "tremolo";

    /// Create a tremolo with default settings.
    pub fn new(ctx: &AudioContext) -> Self {
        let vca = ctx.create_gain(1.0);
        let lfo = ctx.create_oscillator(Waveform::Sine, 1.0);
        let depth = ctx.create_gain(0.0);
        ctx.connect(lfo, depth);
        ctx.connect_param(depth, vca, ParamKind::Gain);

        let stage = Stage::composite(vca, vca, vec![vca, lfo, depth]);
        let mut fx = Self {
            core: EffectCore::new(ctx, Self::MODEL, vec![stage]),
            vca,
            lfo,
            depth,
        };
        fx.set_speed(SPEED.default);
        fx.set_depth(DEPTH.default);
        fx
    }

    /// Set the LFO rate.
    pub fn set_speed(&mut self, v: f32) {
        if let Some(v) = self.core.set(&SPEED, v) {
            let hz = map_to_min_max(exp_scale(v), 1.0, 15.0);
            self.core.ramp(self.lfo, ParamKind::Frequency, hz);
        }
    }

    /// Set the modulation depth.
    pub fn set_depth(&mut self, v: f32) {
        if let Some(v) = self.core.set(&DEPTH, v) {
            self.core.ramp(self.vca, ParamKind::Gain, 1.0 - v / 2.0);
            self.core.ramp(self.depth, ParamKind::Gain, v / 2.0);
        }
    }
}

impl Effect for Tremolo {
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
            ("speed", Some(v)) => self.set_speed(v),
            ("depth", Some(v)) => self.set_depth(v),
            _ => return false,
        }
        true
    }
}
