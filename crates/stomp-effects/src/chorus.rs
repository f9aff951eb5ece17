//! Chorus: a fixed 50/50 blend of the dry signal and an LFO-swept delay.
//!
//! ```text
//!        ┌──────────── dry (0.5) ────────────┐
//! split ─┤                                   ├─ sum
//!        └─ delay ──────────── wet (0.5) ────┘
//!             ▲ delay time
//!   lfo → depth
//! ```

use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage, Waveform, exp_scale,
    linear_cross_fade, map_to_min_max,
};

/// LFO rate, `map(exp(v), 0.1, 8)` Hz.
pub const RATE: ParamSpec = ParamSpec::unit("rate", 0.4);
/// Modulation depth, `map(v, 0, 5 ms)`.
pub const DEPTH: ParamSpec = ParamSpec::unit("depth", 0.6);
/// Base delay, `map(v, 5 ms, 30 ms)`.
pub const DELAY: ParamSpec = ParamSpec::unit("delay", 0.3);

static PARAMS: [ParamSpec; 3] = [RATE, DEPTH, DELAY];

const MAX_DELAY_SECONDS: f32 = 0.05;

/// Modulated-delay chorus.
#[derive(Debug)]
pub struct Chorus {
    core: EffectCore,
    delay: NodeId,
    lfo: NodeId,
    depth: NodeId,
}

impl Chorus {
    /// Model name.
    pub const MODEL: &'static str = "chorus";

    /// Create a chorus with default settings.
    pub fn new(ctx: &AudioContext) -> Self {
        let (dry_level, wet_level) = linear_cross_fade(0.5);
        let split = ctx.create_gain(1.0);
        let dry = ctx.create_gain(dry_level);
        let delay = ctx.create_delay(MAX_DELAY_SECONDS);
        let wet = ctx.create_gain(wet_level);
        let sum = ctx.create_gain(1.0);
        let lfo = ctx.create_oscillator(Waveform::Sine, 1.0);
        let depth = ctx.create_gain(0.0);

        ctx.connect(split, dry);
        ctx.connect(dry, sum);
        ctx.connect(split, delay);
        ctx.connect(delay, wet);
        ctx.connect(wet, sum);
        ctx.connect(lfo, depth);
        ctx.connect_param(depth, delay, ParamKind::DelayTime);

        let stage = Stage::composite(split, sum, vec![split, dry, delay, wet, sum, lfo, depth]);
        let mut chorus = Self {
            core: EffectCore::new(ctx, Self::MODEL, vec![stage]),
            delay,
            lfo,
            depth,
        };
        chorus.set_rate(RATE.default);
        chorus.set_depth(DEPTH.default);
        chorus.set_delay(DELAY.default);
        chorus
    }

    /// Set the sweep rate.
    pub fn set_rate(&mut self, v: f32) {
        if let Some(v) = self.core.set(&RATE, v) {
            let hz = map_to_min_max(exp_scale(v), 0.1, 8.0);
            self.core.ramp(self.lfo, ParamKind::Frequency, hz);
        }
    }

    /// Set the sweep depth.
    pub fn set_depth(&mut self, v: f32) {
        if let Some(v) = self.core.set(&DEPTH, v) {
            self.core
                .ramp(self.depth, ParamKind::Gain, map_to_min_max(v, 0.0, 0.005));
        }
    }

    /// Set the base delay.
    pub fn set_delay(&mut self, v: f32) {
        if let Some(v) = self.core.set(&DELAY, v) {
            self.core.ramp(
                self.delay,
                ParamKind::DelayTime,
                map_to_min_max(v, 0.005, 0.03),
            );
        }
    }
}

impl Effect for Chorus {
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
            ("delay", Some(v)) => self.set_delay(v),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mappings() {
        let ctx = AudioContext::new(48000.0);
        let mut chorus = Chorus::new(&ctx);
        chorus.set_rate(1.0);
        chorus.set_depth(1.0);
        chorus.set_delay(0.0);
        let rate = ctx.param_target(chorus.lfo, ParamKind::Frequency).unwrap();
        assert!((rate - 8.0).abs() < 1e-5);
        assert_eq!(ctx.param_target(chorus.depth, ParamKind::Gain), Some(0.005));
        assert_eq!(
            ctx.param_target(chorus.delay, ParamKind::DelayTime),
            Some(0.005)
        );
    }

    #[test]
    fn half_dry_half_delayed() {
        let ctx = AudioContext::new(48000.0);
        let mut chorus = Chorus::new(&ctx);
        chorus.set_depth(0.0);
        chorus.set_delay(0.0);
        ctx.connect(ctx.line_in(), chorus.input());
        chorus.connect(ctx.destination());

        // let the ramps settle, then send an impulse
        let mut out = vec![0.0; 4096];
        ctx.render(&vec![0.0; 4096], &mut out);
        let mut impulse = vec![0.0; 1024];
        impulse[0] = 1.0;
        let mut out = vec![0.0; 1024];
        ctx.render(&impulse, &mut out);

        assert!((out[0] - 0.5).abs() < 1e-3);
        // 5 ms at 48 kHz
        let echo: f32 = out[239..=241].iter().sum();
        assert!((echo - 0.5).abs() < 0.05, "{echo}");
    }
}
