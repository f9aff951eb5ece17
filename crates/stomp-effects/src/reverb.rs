//! Convolution reverb.
//!
//! ```text
//!        ┌──────────────────── dry ───────────────────┐
//! split ─┤                                            ├─ sum
//!        └─ convolver(room) → StandardTone ─── wet ───┘
//! ```
//!
//! The room starts as a generated decaying-noise tail; `level` blends it in
//! with an equal-power cross-fade.

use crate::error::Result;
use crate::impulse;
use crate::tone::{StandardTone, ToneControl};
use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage, equal_cross_fade};

/// Wet amount, equal-power.
pub const LEVEL: ParamSpec = ParamSpec::unit("level", 0.3);
/// Tail lowpass.
pub const TONE: ParamSpec = ParamSpec::unit("tone", 0.5);

static PARAMS: [ParamSpec; 2] = [LEVEL, TONE];

/// Length of the generated tail in seconds.
pub const ROOM_SECONDS: f32 = 2.0;
/// Envelope exponent of the generated tail.
pub const ROOM_DECAY: f32 = 2.0;

const TONE_MIN_HZ: f32 = 500.0;
const TONE_MAX_HZ: f32 = 6000.0;

/// Reverb pedal.
#[derive(Debug)]
pub struct Reverb {
    core: EffectCore,
    dry: NodeId,
    convolver: NodeId,
    tone: StandardTone,
    wet: NodeId,
}

impl Reverb {
    /// Model name.
    pub const MODEL: &'static str = "reverb";

    /// Create a reverb with the generated room.
    pub fn new(ctx: &AudioContext) -> Self {
        let split = ctx.create_gain(1.0);
        let dry = ctx.create_gain(1.0);
        let convolver = ctx.create_convolver();
        let tone = StandardTone::new(ctx, TONE_MIN_HZ, TONE_MAX_HZ);
        let wet = ctx.create_gain(0.0);
        let sum = ctx.create_gain(1.0);
        let filter = tone.filter();

        ctx.connect(split, dry);
        ctx.connect(dry, sum);
        ctx.connect(split, convolver);
        ctx.connect(convolver, filter);
        ctx.connect(filter, wet);
        ctx.connect(wet, sum);
        ctx.set_impulse(
            convolver,
            &impulse::reverb_impulse(ctx.sample_rate(), ROOM_SECONDS, ROOM_DECAY),
        );

        let stage = Stage::composite(split, sum, vec![split, dry, convolver, filter, wet, sum]);
        let mut fx = Self {
            core: EffectCore::new(ctx, Self::MODEL, vec![stage]),
            dry,
            convolver,
            tone,
            wet,
        };
        fx.set_level(LEVEL.default);
        fx.set_tone(TONE.default);
        fx
    }

    /// Set the wet amount.
    pub fn set_level(&mut self, v: f32) {
        if let Some(v) = self.core.set(&LEVEL, v) {
            let (dry, wet) = equal_cross_fade(v);
            self.core.ramp(self.dry, ParamKind::Gain, dry);
            self.core.ramp(self.wet, ParamKind::Gain, wet);
        }
    }

    /// Set the tail lowpass.
    pub fn set_tone(&mut self, v: f32) {
        if let Some(v) = self.core.set(&TONE, v) {
            self.tone.set_tone(v);
        }
    }

    /// Decode a WAV impulse response and use it as the room.
    ///
    /// On failure the previous room stays in place.
    pub fn load_impulse(&mut self, bytes: &[u8]) -> Result<()> {
        if self.core.is_disposed() {
            return Ok(());
        }
        match impulse::load_impulse(bytes) {
            Ok(response) => {
                tracing::info!(id = %self.core.id(), taps = response.len(), "reverb impulse loaded");
                self.core.ctx().set_impulse(self.convolver, &response);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(id = %self.core.id(), error = %err, "reverb impulse rejected");
                Err(err)
            }
        }
    }
}

impl Effect for Reverb {
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
            ("level", Some(v)) => self.set_level(v),
            ("tone", Some(v)) => self.set_tone(v),
            _ => return false,
        }
        true
    }

    fn on_dispose(&mut self) {
        self.tone.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_is_installed() {
        let ctx = AudioContext::new(48000.0);
        let fx = Reverb::new(&ctx);
        assert!(ctx.has_impulse(fx.convolver));
    }

    #[test]
    fn level_is_equal_power() {
        let ctx = AudioContext::new(48000.0);
        let mut fx = Reverb::new(&ctx);
        for v in [0.0, 0.3, 0.5, 1.0] {
            fx.set_level(v);
            let dry = ctx.param_target(fx.dry, ParamKind::Gain).unwrap();
            let wet = ctx.param_target(fx.wet, ParamKind::Gain).unwrap();
            assert!((dry * dry + wet * wet - 1.0).abs() < 1e-5);
        }
        fx.set_level(0.0);
        assert_eq!(ctx.param_target(fx.dry, ParamKind::Gain), Some(1.0));
        assert_eq!(ctx.param_target(fx.wet, ParamKind::Gain), Some(0.0));
    }

    #[test]
    fn bad_impulse_keeps_room() {
        let ctx = AudioContext::new(48000.0);
        let mut fx = Reverb::new(&ctx);
        assert!(fx.load_impulse(b"not a wav").is_err());
        assert!(ctx.has_impulse(fx.convolver));
    }

    #[test]
    fn tail_follows_impulse() {
        let ctx = AudioContext::new(48000.0);
        let mut fx = Reverb::new(&ctx);
        fx.set_level(1.0);
        ctx.connect(ctx.line_in(), fx.input());
        fx.connect(ctx.destination());
        let mut out = vec![0.0; 4096];
        ctx.render(&vec![0.0; 4096], &mut out);

        let mut input = vec![0.0; 9600];
        input[0] = 1.0;
        let mut out = vec![0.0; 9600];
        ctx.render(&input, &mut out);
        let late: f32 = out[4800..].iter().map(|s| s.abs()).sum();
        assert!(late > 0.0);
        assert!(out.iter().all(|s| s.is_finite()));
    }
}
