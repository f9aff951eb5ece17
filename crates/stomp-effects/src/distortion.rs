//! Waveshaping drive pedals.
//!
//! ```text
//! input → pre gain → waveshaper(curve) → StandardTone → volume → output
//! ```
//!
//! The curve family comes from the [`DistortionModel`]; the `distortion`
//! knob is the curve amount and regenerates the lookup table.

use crate::models::DistortionModel;
use crate::tone::{StandardTone, ToneControl};
use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage, exp_scale, map_to_min_max,
    synthesize,
};

/// Curve amount.
pub const DISTORTION: ParamSpec = ParamSpec::unit("distortion", 0.5);
/// Post-shaper lowpass.
pub const TONE: ParamSpec = ParamSpec::unit("tone", 0.5);
/// Output level, `map(exp(v), 0, 1.5)`.
pub const VOLUME: ParamSpec = ParamSpec::unit("volume", 0.5);

static PARAMS: [ParamSpec; 3] = [DISTORTION, TONE, VOLUME];

/// Points in a synthesized curve, minus one.
pub const CURVE_SAMPLES: usize = 8192;

const TONE_MIN_HZ: f32 = 350.0;
const TONE_MAX_HZ: f32 = 10000.0;

/// Drive pedal for one [`DistortionModel`].
#[derive(Debug)]
pub struct Distortion {
    core: EffectCore,
    voicing: &'static DistortionModel,
    shaper: NodeId,
    tone: StandardTone,
    volume: NodeId,
}

impl Distortion {
    /// Create a drive pedal voiced by `voicing`.
    pub fn new(ctx: &AudioContext, voicing: &'static DistortionModel) -> Self {
        let pre = ctx.create_gain(1.0);
        let shaper = ctx.create_waveshaper();
        let tone = StandardTone::new(ctx, TONE_MIN_HZ, TONE_MAX_HZ);
        let volume = ctx.create_gain(1.0);
        let stages = vec![
            Stage::node(pre),
            Stage::node(shaper),
            tone.stage(),
            Stage::node(volume),
        ];
        let mut fx = Self {
            core: EffectCore::new(ctx, voicing.id, stages),
            voicing,
            shaper,
            tone,
            volume,
        };
        fx.set_distortion(DISTORTION.default);
        fx.set_tone(TONE.default);
        fx.set_volume(VOLUME.default);
        fx
    }

    /// The model this pedal was built from.
    pub fn voicing(&self) -> &'static DistortionModel {
        self.voicing
    }

    /// Set the curve amount and regenerate the table.
    pub fn set_distortion(&mut self, v: f32) {
        if let Some(v) = self.core.set(&DISTORTION, v) {
            let curve = synthesize(self.voicing.curve, v, CURVE_SAMPLES);
            self.core.ctx().set_curve(self.shaper, curve);
        }
    }

    /// Set the tone.
    pub fn set_tone(&mut self, v: f32) {
        if let Some(v) = self.core.set(&TONE, v) {
            self.tone.set_tone(v);
        }
    }

    /// Set the output level.
    pub fn set_volume(&mut self, v: f32) {
        if let Some(v) = self.core.set(&VOLUME, v) {
            let gain = map_to_min_max(exp_scale(v), 0.0, 1.5);
            self.core.ramp(self.volume, ParamKind::Gain, gain);
        }
    }
}

impl Effect for Distortion {
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
            ("distortion", Some(v)) => self.set_distortion(v),
            ("tone", Some(v)) => self.set_tone(v),
            ("volume", Some(v)) => self.set_volume(v),
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
    use crate::models::{DISTORTION_MODELS, distortion_model};
    use stomp_core::CurveFamily;

    #[test]
    fn model_name_is_voicing_id() {
        let ctx = AudioContext::new(48000.0);
        for voicing in &DISTORTION_MODELS {
            let fx = Distortion::new(&ctx, voicing);
            assert_eq!(fx.model(), voicing.id);
        }
    }

    #[test]
    fn knob_regenerates_curve() {
        let ctx = AudioContext::new(48000.0);
        let voicing = distortion_model("ds1").unwrap();
        let mut fx = Distortion::new(&ctx, voicing);
        let before = ctx.curve(fx.shaper).unwrap();
        assert_eq!(before.len(), CURVE_SAMPLES + 1);

        fx.set_distortion(1.0);
        let after = ctx.curve(fx.shaper).unwrap();
        assert_eq!(after, synthesize(CurveFamily::Classic, 1.0, CURVE_SAMPLES));
        assert_ne!(before, after);
    }

    #[test]
    fn volume_taper() {
        let ctx = AudioContext::new(48000.0);
        let mut fx = Distortion::new(&ctx, &DISTORTION_MODELS[0]);
        fx.set_volume(1.0);
        assert_eq!(ctx.param_target(fx.volume, ParamKind::Gain), Some(1.5));
        fx.set_volume(0.5);
        assert_eq!(ctx.param_target(fx.volume, ParamKind::Gain), Some(0.375));
    }

    #[test]
    fn dispose_releases_tone_and_stages() {
        let ctx = AudioContext::new(48000.0);
        let baseline = ctx.node_count();
        let mut fx = Distortion::new(&ctx, &DISTORTION_MODELS[1]);
        assert_eq!(ctx.node_count(), baseline + 6);
        fx.dispose();
        assert_eq!(ctx.node_count(), baseline);
    }
}
