//! Speaker cabinet simulation.
//!
//! ```text
//! input → volume → convolver(impulse) → MixedTone → output
//! ```
//!
//! The cabinet is terminal: a chain keeps it in last place. It starts with
//! the generated cabinet response for the context's sample rate; a WAV
//! response can replace it.

use crate::error::Result;
use crate::impulse;
use crate::tone::{MixedTone, ToneControl};
use stomp_core::graph::{NodeId, ParamKind};
use stomp_core::{AudioContext, Effect, EffectCore, ParamSpec, ParamValue, Stage};

/// Pre-convolution level, applied as linear gain.
pub const VOLUME: ParamSpec = ParamSpec::unit("volume", 0.7);
/// Low/high band blend.
pub const TONE: ParamSpec = ParamSpec::unit("tone", 0.5);

static PARAMS: [ParamSpec; 2] = [VOLUME, TONE];

/// Lowpass band cutoff of the tone stack.
pub const LOW_BAND_HZ: f32 = 700.0;
/// Highpass band cutoff of the tone stack.
pub const HIGH_BAND_HZ: f32 = 1800.0;

/// Convolution cabinet with a two-band tone stack.
#[derive(Debug)]
pub struct Cabinet {
    core: EffectCore,
    volume: NodeId,
    convolver: NodeId,
    tone: MixedTone,
}

impl Cabinet {
    /// Model name.
    pub const MODEL: &'static str = "cabinet";

    /// Create a cabinet loaded with the generated impulse response.
    pub fn new(ctx: &AudioContext) -> Self {
        let volume = ctx.create_gain(VOLUME.default);
        let convolver = ctx.create_convolver();
        let tone = MixedTone::new(ctx, LOW_BAND_HZ, HIGH_BAND_HZ);
        let stages = vec![Stage::node(volume), Stage::node(convolver), tone.stage()];
        let mut cabinet = Self {
            core: EffectCore::new(ctx, Self::MODEL, stages),
            volume,
            convolver,
            tone,
        };
        cabinet.set_volume(VOLUME.default);
        cabinet.set_tone(TONE.default);
        cabinet.set_impulse(&impulse::cabinet_impulse(ctx.sample_rate()));
        cabinet
    }

    /// Set the input level.
    pub fn set_volume(&mut self, v: f32) {
        if let Some(v) = self.core.set(&VOLUME, v) {
            self.core.ramp(self.volume, ParamKind::Gain, v);
        }
    }

    /// Set the tone blend.
    pub fn set_tone(&mut self, v: f32) {
        if let Some(v) = self.core.set(&TONE, v) {
            self.tone.set_tone(v);
        }
    }

    /// Install an already decoded impulse response, scaled to unit energy.
    pub fn set_impulse(&mut self, impulse: &[f32]) {
        if self.core.is_disposed() {
            return;
        }
        let mut scaled = impulse.to_vec();
        impulse::normalize(&mut scaled);
        self.core.ctx().set_impulse(self.convolver, &scaled);
    }

    /// Decode a WAV impulse response and install it.
    ///
    /// On failure the previous response stays in place.
    pub fn load_impulse(&mut self, bytes: &[u8]) -> Result<()> {
        if self.core.is_disposed() {
            return Ok(());
        }
        match impulse::load_impulse(bytes) {
            Ok(response) => {
                tracing::info!(id = %self.core.id(), taps = response.len(), "cabinet impulse loaded");
                self.core.ctx().set_impulse(self.convolver, &response);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(id = %self.core.id(), error = %err, "cabinet impulse rejected");
                Err(err)
            }
        }
    }

    /// Whether an impulse response is installed.
    pub fn has_impulse(&self) -> bool {
        self.core.ctx().has_impulse(self.convolver)
    }
}

impl Effect for Cabinet {
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
            ("volume", Some(v)) => self.set_volume(v),
            ("tone", Some(v)) => self.set_tone(v),
            _ => return false,
        }
        true
    }

    fn is_terminal(&self) -> bool {
        true
    }

    fn on_dispose(&mut self) {
        self.tone.dispose();
    }
}
