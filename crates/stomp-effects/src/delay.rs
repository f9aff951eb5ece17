//! Feedback delay with a darkening repeat filter.
//!
//! ```text
//!        ┌──────────────── dry ─────────────────┐
//! split ─┤                                      ├─ sum
//!        └─ delay ─ tone ─────────── wet ───────┘
//!             ▲      │
//!             └─ feedback
//! ```
//!
//! Each repeat passes through the tone filter again, so later repeats get
//! progressively darker.

use crate::tone::{StandardTone, ToneControl};
use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage, linear_cross_fade,
    map_to_min_max,
};

/// Delay time, `map(v, 0.05, 1.0)` seconds.
pub const TIME: ParamSpec = ParamSpec::unit("time", 0.3);
/// Feedback gain, applied as is.
pub const FEEDBACK: ParamSpec = ParamSpec::ranged("feedback", 0.0, 0.95, 0.4);
/// Repeat filter, 1 to 8 kHz.
pub const TONE: ParamSpec = ParamSpec::unit("tone", 0.5);
/// Dry/wet balance, linear.
pub const MIX: ParamSpec = ParamSpec::unit("mix", 0.35);

static PARAMS: [ParamSpec; 4] = [TIME, FEEDBACK, TONE, MIX];

const MAX_DELAY_SECONDS: f32 = 1.0;
const TONE_MIN_HZ: f32 = 1000.0;
const TONE_MAX_HZ: f32 = 8000.0;

/// Feedback delay pedal.
#[derive(Debug)]
pub struct Delay {
    core: EffectCore,
    dry: NodeId,
    delay: NodeId,
    tone: StandardTone,
    feedback: NodeId,
    wet: NodeId,
}

impl Delay {
    /// Model name.
    pub const MODEL: &'static str = "delay";

    /// Create a delay with default settings.
    pub fn new(ctx: &AudioContext) -> Self {
        let split = ctx.create_gain(1.0);
        let dry = ctx.create_gain(1.0);
        let delay = ctx.create_delay(MAX_DELAY_SECONDS);
        let tone = StandardTone::new(ctx, TONE_MIN_HZ, TONE_MAX_HZ);
        let feedback = ctx.create_gain(0.0);
        let wet = ctx.create_gain(0.0);
        let sum = ctx.create_gain(1.0);
        let filter = tone.filter();

        ctx.connect(split, dry);
        ctx.connect(dry, sum);
        ctx.connect(split, delay);
        ctx.connect(delay, filter);
        ctx.connect(filter, wet);
        ctx.connect(wet, sum);
        ctx.connect(filter, feedback);
        ctx.connect(feedback, delay);

        let stage = Stage::composite(
            split,
            sum,
            vec![split, dry, delay, filter, feedback, wet, sum],
        );
        let mut fx = Self {
            core: EffectCore::new(ctx, Self::MODEL, vec![stage]),
            dry,
            delay,
            tone,
            feedback,
            wet,
        };
        fx.set_time(TIME.default);
        fx.set_feedback(FEEDBACK.default);
        fx.set_tone(TONE.default);
        fx.set_mix(MIX.default);
        fx
    }

    /// Set the delay time.
    pub fn set_time(&mut self, v: f32) {
        if let Some(v) = self.core.set(&TIME, v) {
            self.core.ramp(
                self.delay,
                ParamKind::DelayTime,
                map_to_min_max(v, 0.05, 1.0),
            );
        }
    }

    /// Set the feedback amount.
    pub fn set_feedback(&mut self, v: f32) {
        if let Some(v) = self.core.set(&FEEDBACK, v) {
            self.core.ramp(self.feedback, ParamKind::Gain, v);
        }
    }

    /// Set the repeat filter.
    pub fn set_tone(&mut self, v: f32) {
        if let Some(v) = self.core.set(&TONE, v) {
            self.tone.set_tone(v);
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

impl Effect for Delay {
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
            ("time", Some(v)) => self.set_time(v),
            ("feedback", Some(v)) => self.set_feedback(v),
            ("tone", Some(v)) => self.set_tone(v),
            ("mix", Some(v)) => self.set_mix(v),
            _ => return false,
        }
        true
    }

    fn on_dispose(&mut self) {
        self.tone.dispose();
    }
}
