//! One-pole IIR coefficient derivation and a generic IIR runtime.
//!
//! The coefficients come from the RC time-constant relation
//! `t = 1 / (2π·f)`:
//!
//! ```text
//! lowpass:  a0 = 1 / (t·fs)   feedforward [a0]      feedback [1, a0 - 1]
//! highpass: b1 = 1 / (t·fs) - 1
//!                             feedforward [1, -1]   feedback [1, b1]
//! ```
//!
//! The derivation functions are pure; whenever a cutoff changes the caller
//! derives a fresh [`IirCoefficients`] and hands it to the filter node.
//!
//! # Reference
//!
//! Julius O. Smith III, "Introduction to Digital Filters with Audio Applications",
//! Section: One-Pole Filter.

use crate::math::flush_denormal;
use core::f32::consts::TAU;

/// Feedforward/feedback coefficient arrays for a direct-form IIR filter.
///
/// `feedback[0]` is the output normalization term.
#[derive(Debug, Clone, PartialEq)]
pub struct IirCoefficients {
    /// Numerator (`b`) coefficients.
    pub feedforward: Vec<f32>,
    /// Denominator (`a`) coefficients, `feedback[0]` first.
    pub feedback: Vec<f32>,
}

impl IirCoefficients {
    /// Coefficients that pass the input unchanged.
    pub fn identity() -> Self {
        Self {
            feedforward: vec![1.0],
            feedback: vec![1.0],
        }
    }
}

fn time_constant_ratio(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let t = 1.0 / (TAU * cutoff_hz.max(1e-3));
    1.0 / (t * sample_rate)
}

/// One-pole lowpass coefficients for `cutoff_hz` at `sample_rate`.
pub fn one_pole_lowpass(cutoff_hz: f32, sample_rate: f32) -> IirCoefficients {
    let a0 = time_constant_ratio(cutoff_hz, sample_rate);
    IirCoefficients {
        feedforward: vec![a0],
        feedback: vec![1.0, a0 - 1.0],
    }
}

/// One-pole highpass coefficients for `cutoff_hz` at `sample_rate`.
pub fn one_pole_highpass(cutoff_hz: f32, sample_rate: f32) -> IirCoefficients {
    let b1 = time_constant_ratio(cutoff_hz, sample_rate) - 1.0;
    IirCoefficients {
        feedforward: vec![1.0, -1.0],
        feedback: vec![1.0, b1],
    }
}

/// Direct-form I IIR filter running arbitrary [`IirCoefficients`].
///
/// `y[n] = (Σ b[k]·x[n-k] - Σ_{k≥1} a[k]·y[n-k]) / a[0]`
#[derive(Debug, Clone)]
pub struct IirFilter {
    b: Vec<f32>,
    a: Vec<f32>,
    x_hist: Vec<f32>,
    y_hist: Vec<f32>,
}

impl IirFilter {
    /// Build a filter from coefficients. A zero `a[0]` falls back to identity.
    pub fn new(coefficients: &IirCoefficients) -> Self {
        let mut filter = Self {
            b: Vec::new(),
            a: Vec::new(),
            x_hist: Vec::new(),
            y_hist: Vec::new(),
        };
        filter.set_coefficients(coefficients);
        filter
    }

    /// Replace the coefficients, keeping as much history as still applies.
    pub fn set_coefficients(&mut self, coefficients: &IirCoefficients) {
        let a0 = coefficients.feedback.first().copied().unwrap_or(1.0);
        let valid = a0.abs() > f32::EPSILON && !coefficients.feedforward.is_empty();
        let source = if valid {
            coefficients.clone()
        } else {
            tracing::warn!("iir coefficients rejected, falling back to identity");
            IirCoefficients::identity()
        };
        let norm = 1.0 / source.feedback[0];
        self.b = source.feedforward.iter().map(|c| c * norm).collect();
        self.a = source.feedback.iter().map(|c| c * norm).collect();
        self.x_hist.resize(self.b.len(), 0.0);
        self.y_hist.resize(self.a.len(), 0.0);
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // shift histories: index 0 holds the newest sample
        self.x_hist.rotate_right(1);
        self.x_hist[0] = input;

        let mut acc = 0.0;
        for (b, x) in self.b.iter().zip(&self.x_hist) {
            acc += b * x;
        }
        for (a, y) in self.a.iter().skip(1).zip(&self.y_hist) {
            acc -= a * y;
        }
        let out = flush_denormal(acc);

        if !self.y_hist.is_empty() {
            self.y_hist.rotate_right(1);
            self.y_hist[0] = out;
        }
        out
    }

    /// Clear filter history.
    pub fn reset(&mut self) {
        self.x_hist.fill(0.0);
        self.y_hist.fill(0.0);
    }
}
