//! Stomp Analysis - pitch detection for the tuner
//!
//! - [`detect_pitch`] / [`detect_period`] - autocorrelation fundamental estimator
//! - [`find_closest_note`] over the [`NOTES`] table, [`cents_off`]
//! - [`analyse`] - bytes in, [`TunerReading`] out
//! - [`PitchWorker`] - runs [`analyse`] on its own thread
//!
//! ## Example
//!
//! ```rust
//! use stomp_analysis::{TunerReading, analyse};
//!
//! let silence = vec![128u8; 2048];
//! assert_eq!(analyse(&silence, 48000.0), TunerReading::silent());
//! ```

pub mod notes;
pub mod pitch;
pub mod worker;

pub use notes::{A4_HZ, NOTES, Note, find_closest_note};
pub use pitch::{THRESHOLD_RATIO, TunerReading, analyse, cents_off, detect_period, detect_pitch};
pub use worker::{PitchRequest, PitchResponse, PitchWorker};
