//! Tone controls shared by the drive, delay, reverb and amp effects.
//!
//! - [`StandardTone`] sweeps a single lowpass across `[min_hz, max_hz]` on an
//!   exponential taper.
//! - [`MixedTone`] blends a one-pole lowpass band against a one-pole highpass
//!   band, the way passive amp tone stacks sound.
//!
//! Both expose their nodes as one [`Stage`] so the owning effect can splice
//! them into its chain.

use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{
    AudioContext, BiquadKind, Stage, clamp, exp_scale, map_to_min_max, one_pole_highpass,
    one_pole_lowpass,
};

/// Tone value applied at construction.
pub const DEFAULT_TONE: f32 = 0.5;

/// Butterworth Q: no resonant peak, so a feedback path through the filter stays below unity.
const STANDARD_Q: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// A tone stage that can be spliced into an effect chain.
pub trait ToneControl: Send {
    /// Set the tone knob, clamped to `[0, 1]`.
    fn set_tone(&mut self, tone: f32);

    /// Current tone knob.
    fn tone(&self) -> f32;

    /// Entry, exit and owned nodes.
    fn stage(&self) -> Stage;

    /// Release every node. Idempotent.
    fn dispose(&mut self);
}

/// Single lowpass biquad with an exponentially swept cutoff.
#[derive(Debug)]
pub struct StandardTone {
    ctx: AudioContext,
    filter: NodeId,
    min_hz: f32,
    max_hz: f32,
    tone: f32,
    disposed: bool,
}

impl StandardTone {
    /// Tone sweeping `[min_hz, max_hz]`, starting at [`DEFAULT_TONE`].
    pub fn new(ctx: &AudioContext, min_hz: f32, max_hz: f32) -> Self {
        let cutoff = map_to_min_max(exp_scale(DEFAULT_TONE), min_hz, max_hz);
        Self {
            ctx: ctx.clone(),
            filter: ctx.create_biquad(BiquadKind::Lowpass, cutoff, STANDARD_Q),
            min_hz,
            max_hz,
            tone: DEFAULT_TONE,
            disposed: false,
        }
    }

    /// Cutoff in Hz for the current tone.
    pub fn cutoff(&self) -> f32 {
        map_to_min_max(exp_scale(self.tone), self.min_hz, self.max_hz)
    }

    /// The lowpass node.
    pub fn filter(&self) -> NodeId {
        self.filter
    }
}

impl ToneControl for StandardTone {
    fn set_tone(&mut self, tone: f32) {
        if self.disposed {
            return;
        }
        self.tone = clamp(tone, 0.0, 1.0);
        self.ctx
            .ramp_param(self.filter, ParamKind::Frequency, self.cutoff());
    }

    fn tone(&self) -> f32 {
        self.tone
    }

    fn stage(&self) -> Stage {
        Stage::node(self.filter)
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.ctx.disconnect(self.filter);
        self.ctx.release(self.filter);
        self.disposed = true;
    }
}

/// Parallel low and high one-pole bands with a tone cross-fade.
///
/// ```text
/// split ─▶ lowpass  ─▶ low gain  (1 − tone) ─┐
///       └▶ highpass ─▶ high gain (tone)     ─┴▶ sum
/// ```
#[derive(Debug)]
pub struct MixedTone {
    ctx: AudioContext,
    split: NodeId,
    lowpass: NodeId,
    highpass: NodeId,
    low_gain: NodeId,
    high_gain: NodeId,
    sum: NodeId,
    tone: f32,
    disposed: bool,
}

impl MixedTone {
    /// Bands split at `low_hz` (lowpass) and `high_hz` (highpass).
    pub fn new(ctx: &AudioContext, low_hz: f32, high_hz: f32) -> Self {
        let sr = ctx.sample_rate();
        let split = ctx.create_gain(1.0);
        let lowpass = ctx.create_iir(&one_pole_lowpass(low_hz, sr));
        let highpass = ctx.create_iir(&one_pole_highpass(high_hz, sr));
        let low_gain = ctx.create_gain(1.0 - DEFAULT_TONE);
        let high_gain = ctx.create_gain(DEFAULT_TONE);
        let sum = ctx.create_gain(1.0);

        ctx.connect(split, lowpass);
        ctx.connect(lowpass, low_gain);
        ctx.connect(low_gain, sum);
        ctx.connect(split, highpass);
        ctx.connect(highpass, high_gain);
        ctx.connect(high_gain, sum);

        Self {
            ctx: ctx.clone(),
            split,
            lowpass,
            highpass,
            low_gain,
            high_gain,
            sum,
            tone: DEFAULT_TONE,
            disposed: false,
        }
    }

    /// Recompute both band filters for new cutoffs.
    pub fn set_cutoffs(&mut self, low_hz: f32, high_hz: f32) {
        if self.disposed {
            return;
        }
        let sr = self.ctx.sample_rate();
        self.ctx
            .set_iir_coefficients(self.lowpass, &one_pole_lowpass(low_hz, sr));
        self.ctx
            .set_iir_coefficients(self.highpass, &one_pole_highpass(high_hz, sr));
    }

    /// `(low, high)` gain nodes.
    pub fn band_gains(&self) -> (NodeId, NodeId) {
        (self.low_gain, self.high_gain)
    }

    fn nodes(&self) -> [NodeId; 6] {
        [
            self.split,
            self.lowpass,
            self.highpass,
            self.low_gain,
            self.high_gain,
            self.sum,
        ]
    }
}

impl ToneControl for MixedTone {
    fn set_tone(&mut self, tone: f32) {
        if self.disposed {
            return;
        }
        self.tone = clamp(tone, 0.0, 1.0);
        self.ctx
            .ramp_param(self.high_gain, ParamKind::Gain, self.tone);
        self.ctx
            .ramp_param(self.low_gain, ParamKind::Gain, 1.0 - self.tone);
    }

    fn tone(&self) -> f32 {
        self.tone
    }

    fn stage(&self) -> Stage {
        Stage::composite(self.split, self.sum, self.nodes().to_vec())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for node in self.nodes() {
            self.ctx.disconnect(node);
            self.ctx.release(node);
        }
        self.disposed = true;
    }
}
