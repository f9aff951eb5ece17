//! Fuzz with a passive two-band tone stack.
//!
//! ```text
//! input → gain → highpass → waveshaper → lowpass → MixedTone → volume → output
//! ```
//!
//! The waveshaper family is configurable by name and published as the text
//! control `curve`; `sustain` is the curve amount.

use crate::distortion::CURVE_SAMPLES;
use crate::error::Result;
use crate::tone::{MixedTone, ToneControl};
use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, CurveFamily, Effect, EffectCore, ParamSpec, ParamValue, Stage,
    one_pole_highpass, one_pole_lowpass, synthesize,
};

/// Curve amount.
pub const SUSTAIN: ParamSpec = ParamSpec::unit("sustain", 0.6);
/// Low/high band blend.
pub const TONE: ParamSpec = ParamSpec::unit("tone", 0.5);
/// Output level, linear.
pub const VOLUME: ParamSpec = ParamSpec::unit("volume", 0.6);

static PARAMS: [ParamSpec; 3] = [SUSTAIN, TONE, VOLUME];

/// Curve family used when none is configured.
pub const DEFAULT_CURVE: CurveFamily = CurveFamily::Sustained;

const INPUT_GAIN: f32 = 1.0;
const HIGHPASS_HZ: f32 = 90.0;
const LOWPASS_HZ: f32 = 4500.0;
const LOW_BAND_HZ: f32 = 460.0;
const HIGH_BAND_HZ: f32 = 1200.0;

/// Fuzz pedal.
#[derive(Debug)]
pub struct Muff {
    core: EffectCore,
    family: CurveFamily,
    shaper: NodeId,
    tone: MixedTone,
    volume: NodeId,
}

impl Muff {
    /// Model name.
    pub const MODEL: &'static str = "muff";

    /// Create a fuzz with [`DEFAULT_CURVE`].
    pub fn new(ctx: &AudioContext) -> Self {
        Self::with_family(ctx, DEFAULT_CURVE)
    }

    /// Create a fuzz whose curve family is given by name.
    ///
    /// An unknown name is [`EffectError::UnknownCurve`](crate::EffectError::UnknownCurve).
    pub fn with_curve(ctx: &AudioContext, curve: &str) -> Result<Self> {
        let family: CurveFamily = curve.parse()?;
        Ok(Self::with_family(ctx, family))
    }

    /// Create a fuzz with an explicit curve family.
    pub fn with_family(ctx: &AudioContext, family: CurveFamily) -> Self {
        let sr = ctx.sample_rate();
        let input_gain = ctx.create_gain(INPUT_GAIN);
        let highpass = ctx.create_iir(&one_pole_highpass(HIGHPASS_HZ, sr));
        let shaper = ctx.create_waveshaper();
        let lowpass = ctx.create_iir(&one_pole_lowpass(LOWPASS_HZ, sr));
        let tone = MixedTone::new(ctx, LOW_BAND_HZ, HIGH_BAND_HZ);
        let volume = ctx.create_gain(1.0);
        let stages = vec![
            Stage::node(input_gain),
            Stage::node(highpass),
            Stage::node(shaper),
            Stage::node(lowpass),
            tone.stage(),
            Stage::node(volume),
        ];
        let mut fx = Self {
            core: EffectCore::new(ctx, Self::MODEL, stages),
            family,
            shaper,
            tone,
            volume,
        };
        fx.core
            .publish("curve", ParamValue::Text(family.name().to_string()));
        fx.set_sustain(SUSTAIN.default);
        fx.set_tone(TONE.default);
        fx.set_volume(VOLUME.default);
        fx
    }

    /// Configured curve family.
    pub fn family(&self) -> CurveFamily {
        self.family
    }

    /// Switch the curve family by name and regenerate the table.
    ///
    /// An unknown name leaves the current family in place.
    pub fn set_curve(&mut self, curve: &str) -> Result<()> {
        let family: CurveFamily = curve.parse()?;
        if self.core.is_disposed() {
            return Ok(());
        }
        self.family = family;
        self.core
            .publish("curve", ParamValue::Text(family.name().to_string()));
        if let Some(amount) = self.core.number("sustain") {
            let table = synthesize(family, amount, CURVE_SAMPLES);
            self.core.ctx().set_curve(self.shaper, table);
        }
        Ok(())
    }

    /// Set the curve amount and regenerate the table.
    pub fn set_sustain(&mut self, v: f32) {
        if let Some(v) = self.core.set(&SUSTAIN, v) {
            let curve = synthesize(self.family, v, CURVE_SAMPLES);
            self.core.ctx().set_curve(self.shaper, curve);
        }
    }

    /// Set the tone blend.
    pub fn set_tone(&mut self, v: f32) {
        if let Some(v) = self.core.set(&TONE, v) {
            self.tone.set_tone(v);
        }
    }

    /// Set the output level.
    pub fn set_volume(&mut self, v: f32) {
        if let Some(v) = self.core.set(&VOLUME, v) {
            self.core.ramp(self.volume, ParamKind::Gain, v);
        }
    }
}

impl Effect for Muff {
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
        if name == "curve" {
            return value
                .as_text()
                .is_some_and(|curve| self.set_curve(curve).is_ok());
        }
        match (name, value.as_number()) {
            ("sustain", Some(v)) => self.set_sustain(v),
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
