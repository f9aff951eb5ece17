//! Four-stage allpass phaser.
//!
//! ```text
//!        ┌───────────────────── dry ──────────────────────┐
//! split ─┤                                                ├─ sum
//!        └─ ap1 → ap2 → ap3 → ap4 ─────────── wet ────────┘
//!             ▲     ▲     ▲     ▲ frequency
//!   lfo → depth ────┴─────┴─────┘
//! ```
//!
//! The LFO sweeps every allpass centre around [`CENTRE_HZ`].

use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, BiquadKind, Effect, EffectCore, ParamSpec, ParamValue, Stage, Waveform,
    exp_scale, linear_cross_fade, map_to_min_max,
};

/// LFO rate, `map(exp(v), 0.1, 8)` Hz.
pub const RATE: ParamSpec = ParamSpec::unit("rate", 0.3);
/// Sweep width, `map(v, 0, 1000)` Hz.
pub const DEPTH: ParamSpec = ParamSpec::unit("depth", 0.5);
/// Dry/wet balance, linear.
pub const MIX: ParamSpec = ParamSpec::unit("mix", 0.5);

static PARAMS: [ParamSpec; 3] = [RATE, DEPTH, MIX];

/// Allpass centre frequency.
pub const CENTRE_HZ: f32 = 1000.0;
const STAGES: usize = 4;
const ALLPASS_Q: f32 = 0.7;

/// Phaser pedal.
#[derive(Debug)]
pub struct Phaser {
    core: EffectCore,
    allpasses: [NodeId; STAGES],
    lfo: NodeId,
    depth: NodeId,
    dry: NodeId,
    wet: NodeId,
}

impl Phaser {
    /// Model name.
    pub const MODEL: &'static str = "phaser";

    /// Create a phaser with default settings.
    pub fn new(ctx: &AudioContext) -> Self {
        let split = ctx.create_gain(1.0);
        let dry = ctx.create_gain(1.0);
        let wet = ctx.create_gain(0.0);
        let sum = ctx.create_gain(1.0);
        let allpasses: [NodeId; STAGES] =
            std::array::from_fn(|_| ctx.create_biquad(BiquadKind::Allpass, CENTRE_HZ, ALLPASS_Q));
        let lfo = ctx.create_oscillator(Waveform::Sine, 1.0);
        let depth = ctx.create_gain(0.0);

        ctx.connect(split, dry);
        ctx.connect(dry, sum);
        let mut prev = split;
        for &ap in &allpasses {
            ctx.connect(prev, ap);
            ctx.connect_param(depth, ap, ParamKind::Frequency);
            prev = ap;
        }
        ctx.connect(prev, wet);
        ctx.connect(wet, sum);
        ctx.connect(lfo, depth);

        let mut nodes = vec![split, dry, wet, sum, lfo, depth];
        nodes.extend(allpasses);
        let stage = Stage::composite(split, sum, nodes);
        let mut fx = Self {
            core: EffectCore::new(ctx, Self::MODEL, vec![stage]),
            allpasses,
            lfo,
            depth,
            dry,
            wet,
        };
        fx.set_rate(RATE.default);
        fx.set_depth(DEPTH.default);
        fx.set_mix(MIX.default);
        fx
    }

    /// Set the sweep rate.
    pub fn set_rate(&mut self, v: f32) {
        if let Some(v) = self.core.set(&RATE, v) {
            let hz = map_to_min_max(exp_scale(v), 0.1, 8.0);
            self.core.ramp(self.lfo, ParamKind::Frequency, hz);
        }
    }

    /// Set the sweep width.
    pub fn set_depth(&mut self, v: f32) {
        if let Some(v) = self.core.set(&DEPTH, v) {
            self.core
                .ramp(self.depth, ParamKind::Gain, map_to_min_max(v, 0.0, 1000.0));
        }
    }

    /// Set the dry/wet balance.
    pub fn set_mix(&mut self, v: f32) {
        if let Some(v) = self.core.set(&MIX, v) {
            let (dry, wet) = linear_cross_fade(v);
            self.core.ramp(self.dry, ParamKind::Gain, dry);
            self.core.ramp(self.wet, ParamKind::Gain, wet);
        }
    }
}

impl Effect for Phaser {
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
            ("rate", Some(v)) => self.set_rate(v),
            ("depth", Some(v)) => self.set_depth(v),
            ("mix", Some(v)) => self.set_mix(v),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lfo_drives_every_allpass() {
        let ctx = AudioContext::new(48000.0);
        let fx = Phaser::new(&ctx);
        for ap in fx.allpasses {
            assert_eq!(ctx.param_target(ap, ParamKind::Frequency), Some(CENTRE_HZ));
        }
        let outputs = ctx.outputs(fx.depth);
        assert_eq!(outputs.len(), STAGES);
        assert!(fx.allpasses.iter().all(|ap| outputs.contains(ap)));
        assert_eq!(ctx.param_target(fx.depth, ParamKind::Gain), Some(500.0));
    }

    #[test]
    fn mix_is_linear() {
        let ctx = AudioContext::new(48000.0);
        let mut fx = Phaser::new(&ctx);
        fx.set_mix(0.25);
        assert_eq!(ctx.param_target(fx.dry, ParamKind::Gain), Some(0.75));
        assert_eq!(ctx.param_target(fx.wet, ParamKind::Gain), Some(0.25));
    }

    #[test]
    fn wet_path_keeps_energy() {
        let ctx = AudioContext::new(48000.0);
        let mut fx = Phaser::new(&ctx);
        fx.set_mix(1.0);
        fx.set_depth(0.0);
        ctx.connect(ctx.line_in(), fx.input());
        fx.connect(ctx.destination());

        let input: Vec<f32> = (0..9600)
            .map(|i| 0.5 * (std::f32::consts::TAU * 300.0 * i as f32 / 48000.0).sin())
            .collect();
        let mut out = vec![0.0; 9600];
        ctx.render(&input, &mut out);
        // allpasses change phase, not level
        let peak = out[4800..].iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.05, "{peak}");
    }
}
