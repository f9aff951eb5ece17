//! Stomp Core - signal graph and effect plumbing for the stomp guitar rig
//!
//! This crate holds everything the concrete effects are built from: the host
//! audio graph they wire nodes into, the parameter conventions they share, the
//! waveshaper curve synthesizer and the bypass-safe [`Effect`] interface.
//!
//! # Core Abstractions
//!
//! ## Graph
//!
//! - [`AudioContext`] - Shared handle to the node graph, renders in 128-frame quanta
//! - [`graph::NodeId`], [`graph::ParamKind`] - Node and parameter addressing
//!
//! ## Effects
//!
//! - [`Effect`] - Capability trait: bypass, connect, dispose, snapshot/restore
//! - [`EffectCore`] - Ports, stages and observable params shared by all effects
//! - [`Stage`] - One entry/exit pair in an effect's internal chain
//!
//! ## Parameters
//!
//! - [`ParamSpec`] - Documented range of one control
//! - [`SmoothedParam`], [`AudioParam`] - 10 ms exponential ramps
//! - [`ParamState`], [`Observable`] - Subscribable last-applied values
//!
//! ## DSP Building Blocks
//!
//! - [`Biquad`] - RBJ second-order section
//! - [`IirFilter`] with [`one_pole_lowpass`] / [`one_pole_highpass`]
//! - [`InterpolatedDelay`], [`Oscillator`], [`EnvelopeFollower`]
//! - [`synthesize`] over [`CurveFamily`] - waveshaper lookup tables
//!
//! ## Utilities
//!
//! - Mapping: [`clamp`], [`map_to_min_max`], [`exp_scale`]
//! - Cross-fades: [`linear_cross_fade`], [`equal_cross_fade`]
//! - Levels: [`db_to_linear`], [`linear_to_db`]
//!
//! # Example
//!
//! ```rust
//! use stomp_core::{clamp, exp_scale, map_to_min_max};
//!
//! // a knob at 0.5 driving an LFO between 0.1 and 8 Hz on an exponential taper
//! let rate = map_to_min_max(exp_scale(clamp(0.5, 0.0, 1.0)), 0.1, 8.0);
//! assert!((rate - 2.075).abs() < 1e-4);
//! ```

pub mod biquad;
pub mod curve;
pub mod delay;
pub mod effect;
pub mod envelope;
pub mod graph;
pub mod math;
pub mod observable;
pub mod one_pole;
pub mod oscillator;
pub mod param;
pub mod snapshot;

pub use biquad::{Biquad, BiquadCoefficients, BiquadKind};
pub use curve::{CurveError, CurveFamily, synthesize};
pub use delay::InterpolatedDelay;
pub use effect::{Effect, EffectCore, EffectId, Stage};
pub use envelope::EnvelopeFollower;
pub use graph::AudioContext;
pub use math::{
    clamp, db_to_linear, equal_cross_fade, exp_scale, flush_denormal, lerp, linear_cross_fade,
    linear_to_db, map_to_min_max,
};
pub use observable::{Observable, ParamState, SubscriptionId};
pub use one_pole::{IirCoefficients, IirFilter, one_pole_highpass, one_pole_lowpass};
pub use oscillator::{Oscillator, Waveform};
pub use param::{AudioParam, ParamSpec, RAMP_TIME_CONSTANT_MS, SmoothedParam};
pub use snapshot::{EffectSnapshot, ParamMap, ParamValue};
