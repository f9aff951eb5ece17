//! Biquad (bi-quadratic) filter structure.
//!
//! A second-order IIR section with RBJ Audio EQ Cookbook coefficients. The
//! graph's BiquadFilter node wraps one of these and recomputes coefficients
//! whenever its frequency, Q or gain parameters move.

use core::f32::consts::PI;
use libm::{cosf, powf, sinf};

/// Coefficient tuple `(b0, b1, b2, a0, a1, a2)`.
pub type BiquadCoefficients = (f32, f32, f32, f32, f32, f32);

/// Response type of a biquad section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiquadKind {
    /// 12 dB/oct lowpass.
    #[default]
    Lowpass,
    /// 12 dB/oct highpass.
    Highpass,
    /// Constant 0 dB peak bandpass.
    Bandpass,
    /// Band reject.
    Notch,
    /// Flat magnitude, frequency-dependent phase.
    Allpass,
    /// Bell boost/cut, uses the gain parameter.
    Peaking,
}

/// Direct Form I biquad.
///
/// ```text
/// y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
///                - a1*y[n-1] - a2*y[n-2]
/// ```
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// A biquad with passthrough coefficients.
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Set coefficients, normalizing by `a0`.
    pub fn set_coefficients(&mut self, (b0, b1, b2, a0, a1, a2): BiquadCoefficients) {
        let a0_inv = 1.0 / a0;
        self.b0 = b0 * a0_inv;
        self.b1 = b1 * a0_inv;
        self.b2 = b2 * a0_inv;
        self.a1 = a1 * a0_inv;
        self.a2 = a2 * a0_inv;
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = crate::math::flush_denormal(output);

        output
    }

    /// Clear the delay lines.
    pub fn clear(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl Default for Biquad {
    fn default() -> Self {
        Self::new()
    }
}

/// Coefficients for `kind` at `frequency` Hz.
///
/// The frequency is kept inside `(10 Hz, 0.49·fs)` and Q above 1e-4 so a
/// modulated node can never produce an unstable section.
pub fn coefficients(
    kind: BiquadKind,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> BiquadCoefficients {
    let frequency = frequency.clamp(10.0, sample_rate * 0.49);
    let q = q.max(1e-4);
    match kind {
        BiquadKind::Lowpass => lowpass_coefficients(frequency, q, sample_rate),
        BiquadKind::Highpass => highpass_coefficients(frequency, q, sample_rate),
        BiquadKind::Bandpass => bandpass_coefficients(frequency, q, sample_rate),
        BiquadKind::Notch => notch_coefficients(frequency, q, sample_rate),
        BiquadKind::Allpass => allpass_coefficients(frequency, q, sample_rate),
        BiquadKind::Peaking => peaking_eq_coefficients(frequency, q, gain_db, sample_rate),
    }
}

fn omega_terms(frequency: f32, q: f32, sample_rate: f32) -> (f32, f32) {
    let omega = 2.0 * PI * frequency / sample_rate;
    (cosf(omega), sinf(omega) / (2.0 * q))
}

/// RBJ lowpass.
pub fn lowpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    let b1 = 1.0 - cos_omega;
    (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// RBJ highpass.
pub fn highpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    let b0 = (1.0 + cos_omega) / 2.0;
    (b0, -(1.0 + cos_omega), b0, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// RBJ bandpass (0 dB peak gain).
pub fn bandpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_omega, 1.0 - alpha)
}

/// RBJ notch.
pub fn notch_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    let b1 = -2.0 * cos_omega;
    (1.0, b1, 1.0, 1.0 + alpha, b1, 1.0 - alpha)
}

/// RBJ allpass.
pub fn allpass_coefficients(frequency: f32, q: f32, sample_rate: f32) -> BiquadCoefficients {
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    let b1 = -2.0 * cos_omega;
    (1.0 - alpha, b1, 1.0 + alpha, 1.0 + alpha, b1, 1.0 - alpha)
}

/// RBJ peaking EQ.
pub fn peaking_eq_coefficients(
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
) -> BiquadCoefficients {
    let a = powf(10.0, gain_db / 40.0);
    let (cos_omega, alpha) = omega_terms(frequency, q, sample_rate);
    let b1 = -2.0 * cos_omega;
    (
        1.0 + alpha * a,
        b1,
        1.0 - alpha * a,
        1.0 + alpha / a,
        b1,
        1.0 - alpha / a,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steady_state_gain(kind: BiquadKind, freq: f32, test_hz: f32) -> f32 {
        let sr = 48000.0;
        let mut biquad = Biquad::new();
        biquad.set_coefficients(coefficients(kind, freq, 0.707, 0.0, sr));
        let mut peak: f32 = 0.0;
        for i in 0..9600 {
            let x = sinf(2.0 * PI * test_hz * i as f32 / sr);
            let y = biquad.process(x);
            if i > 4800 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn passthrough_by_default() {
        let mut biquad = Biquad::new();
        for i in 0..10 {
            let input = i as f32 * 0.1;
            assert!((biquad.process(input) - input).abs() < 1e-6);
        }
    }

    #[test]
    fn lowpass_attenuates_above_cutoff() {
        assert!(steady_state_gain(BiquadKind::Lowpass, 500.0, 100.0) > 0.9);
        assert!(steady_state_gain(BiquadKind::Lowpass, 500.0, 8000.0) < 0.05);
    }

    #[test]
    fn highpass_attenuates_below_cutoff() {
        assert!(steady_state_gain(BiquadKind::Highpass, 2000.0, 100.0) < 0.05);
        assert!(steady_state_gain(BiquadKind::Highpass, 2000.0, 12000.0) > 0.9);
    }

    #[test]
    fn allpass_keeps_magnitude() {
        for freq_hz in [200.0, 1000.0, 5000.0] {
            let g = steady_state_gain(BiquadKind::Allpass, 1000.0, freq_hz);
            assert!((g - 1.0).abs() < 0.05, "freq_hz {freq_hz}: {g}");
        }
    }

    #[test]
    fn extreme_frequencies_stay_finite() {
        let mut biquad = Biquad::new();
        biquad.set_coefficients(coefficients(BiquadKind::Lowpass, 1e9, 0.0, 0.0, 48000.0));
        for _ in 0..1000 {
            assert!(biquad.process(1.0).is_finite());
        }
    }
}
