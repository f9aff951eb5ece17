//! Tagged union over every built-in effect.
//!
//! A chain stores [`Pedal`]s by value; [`Effect`] is implemented by
//! delegating to the wrapped effect, hooks included.

use crate::{Cabinet, Chorus, Compressor, Delay, Distortion, Muff, Phaser, Reverb, Tremolo, Tuner};
use stomp_core::{Effect, EffectCore, ParamSpec, ParamValue};

/// Any built-in effect.
#[derive(Debug)]
pub enum Pedal {
    /// Speaker cabinet.
    Cabinet(Cabinet),
    /// Chorus.
    Chorus(Chorus),
    /// Compressor.
    Compressor(Compressor),
    /// Feedback delay.
    Delay(Delay),
    /// Waveshaping drive, any voicing.
    Distortion(Distortion),
    /// Fuzz.
    Muff(Muff),
    /// Phaser.
    Phaser(Phaser),
    /// Convolution reverb.
    Reverb(Reverb),
    /// Tremolo.
    Tremolo(Tremolo),
    /// Tuner.
    Tuner(Tuner),
}

macro_rules! dispatch {
    ($self:expr, $fx:ident => $body:expr) => {
        match $self {
            Pedal::Cabinet($fx) => $body,
            Pedal::Chorus($fx) => $body,
            Pedal::Compressor($fx) => $body,
            Pedal::Delay($fx) => $body,
            Pedal::Distortion($fx) => $body,
            Pedal::Muff($fx) => $body,
            Pedal::Phaser($fx) => $body,
            Pedal::Reverb($fx) => $body,
            Pedal::Tremolo($fx) => $body,
            Pedal::Tuner($fx) => $body,
        }
    };
}

impl Effect for Pedal {
    fn core(&self) -> &EffectCore {
        dispatch!(self, fx => fx.core())
    }

    fn core_mut(&mut self) -> &mut EffectCore {
        dispatch!(self, fx => fx.core_mut())
    }

    fn param_specs(&self) -> &'static [ParamSpec] {
        dispatch!(self, fx => fx.param_specs())
    }

    fn apply_param(&mut self, name: &str, value: &ParamValue) -> bool {
        dispatch!(self, fx => fx.apply_param(name, value))
    }

    fn is_terminal(&self) -> bool {
        dispatch!(self, fx => fx.is_terminal())
    }

    fn on_bypass_change(&mut self, engaged: bool) {
        dispatch!(self, fx => fx.on_bypass_change(engaged))
    }

    fn on_dispose(&mut self) {
        dispatch!(self, fx => fx.on_dispose())
    }
}

macro_rules! impl_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Pedal {
                fn from(fx: $variant) -> Self {
                    Pedal::$variant(fx)
                }
            }
        )*
    };
}

impl_from!(Cabinet, Chorus, Compressor, Delay, Distortion, Muff, Phaser, Reverb, Tremolo, Tuner);

impl Pedal {
    /// The wrapped tuner, if this is one.
    pub fn as_tuner(&self) -> Option<&Tuner> {
        match self {
            Pedal::Tuner(t) => Some(t),
            _ => None,
        }
    }

    /// The wrapped cabinet, if this is one.
    pub fn as_cabinet(&self) -> Option<&Cabinet> {
        match self {
            Pedal::Cabinet(c) => Some(c),
            _ => None,
        }
    }

    /// The wrapped cabinet, mutably.
    pub fn as_cabinet_mut(&mut self) -> Option<&mut Cabinet> {
        match self {
            Pedal::Cabinet(c) => Some(c),
            _ => None,
        }
    }

    /// The wrapped reverb, mutably.
    pub fn as_reverb_mut(&mut self) -> Option<&mut Reverb> {
        match self {
            Pedal::Reverb(r) => Some(r),
            _ => None,
        }
    }

    /// Install a WAV impulse response on a cabinet or reverb.
    ///
    /// Returns `None` for effects without a convolver.
    pub fn load_impulse(&mut self, bytes: &[u8]) -> Option<crate::Result<()>> {
        match self {
            Pedal::Cabinet(c) => Some(c.load_impulse(bytes)),
            Pedal::Reverb(r) => Some(r.load_impulse(bytes)),
            _ => None,
        }
    }
}
