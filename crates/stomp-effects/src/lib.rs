//! Stomp Effects - the pedalboard
//!
//! Every effect wires graph nodes through [`stomp_core::EffectCore`] and
//! exposes normalized `0..1` controls that are clamped, published and mapped
//! onto node parameters with 10 ms ramps.
//!
//! | model | type | controls |
//! |-------|------|----------|
//! | `cabinet` | [`Cabinet`] | volume, tone |
//! | `chorus` | [`Chorus`] | rate, depth, delay |
//! | `compressor` | [`Compressor`] | threshold, ratio, attack, release, volume |
//! | `delay` | [`Delay`] | time, feedback, tone, mix |
//! | voicings in [`DISTORTION_MODELS`] | [`Distortion`] | distortion, tone, volume |
//! | `muff` | [`Muff`] | sustain, tone, volume |
//! | `phaser` | [`Phaser`] | rate, depth, mix |
//! | `reverb` | [`Reverb`] | level, tone |
//! | `tremolo` | [`Tremolo`] | speed, depth |
//! | `tuner` | [`Tuner`] | none |
//!
//! [`Pedal`] wraps any of them so a chain can hold a mixed list.
//!
//! ## Example
//!
//! ```rust
//! use stomp_core::{AudioContext, Effect};
//! use stomp_effects::{Delay, Pedal};
//!
//! let ctx = AudioContext::new(48000.0);
//! let mut pedal = Pedal::from(Delay::new(&ctx));
//! ctx.connect(ctx.line_in(), pedal.input());
//! pedal.connect(ctx.destination());
//!
//! pedal.toggle_bypass();
//! assert!(!pedal.is_active());
//! ```

pub mod cabinet;
pub mod chorus;
pub mod compressor;
pub mod delay;
pub mod distortion;
pub mod error;
pub mod impulse;
pub mod models;
pub mod muff;
pub mod pedal;
pub mod phaser;
pub mod reverb;
pub mod tone;
pub mod tremolo;
pub mod tuner;

pub use cabinet::Cabinet;
pub use chorus::Chorus;
pub use compressor::Compressor;
pub use delay::Delay;
pub use distortion::Distortion;
pub use error::{EffectError, Result};
pub use impulse::{cabinet_impulse, load_impulse, reverb_impulse};
pub use models::{DISTORTION_MODELS, DistortionModel, distortion_model};
pub use muff::Muff;
pub use pedal::Pedal;
pub use phaser::Phaser;
pub use reverb::Reverb;
pub use tone::{MixedTone, StandardTone, ToneControl};
pub use tremolo::Tremolo;
pub use tuner::{Tuner, TunerSampler};
