//! Phase-accumulating oscillator.
//!
//! Drives the modulation sources of chorus, phaser and tremolo. Output is
//! bipolar in `[-1, 1]`; the graph scales it with a gain node before it
//! reaches the parameter it modulates.

use core::f32::consts::TAU;
use libm::{floorf, sinf};

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Sine.
    #[default]
    Sine,
    /// Triangle.
    Triangle,
    /// Rising ramp.
    Sawtooth,
    /// Square.
    Square,
}

/// Phase accumulator with a per-sample frequency input.
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f32,
    sample_rate: f32,
    waveform: Waveform,
}

impl Oscillator {
    /// New oscillator at phase zero.
    pub fn new(sample_rate: f32, waveform: Waveform) -> Self {
        Self {
            phase: 0.0,
            sample_rate,
            waveform,
        }
    }

    /// Change the waveform.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set phase in `[0, 1)`.
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = phase - floorf(phase);
    }

    /// Current phase in `[0, 1)`.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Produce one sample at `frequency` Hz and advance.
    #[inline]
    pub fn next(&mut self, frequency: f32) -> f32 {
        let out = match self.waveform {
            Waveform::Sine => sinf(self.phase * TAU),
            Waveform::Triangle => {
                if self.phase < 0.5 {
                    4.0 * self.phase - 1.0
                } else {
                    3.0 - 4.0 * self.phase
                }
            }
            Waveform::Sawtooth => 2.0 * self.phase - 1.0,
            Waveform::Square => {
                if self.phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        };
        self.phase += frequency / self.sample_rate;
        self.phase -= floorf(self.phase);
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_completes_one_cycle() {
        let mut osc = Oscillator::new(100.0, Waveform::Sine);
        let samples: Vec<f32> = (0..100).map(|_| osc.next(1.0)).collect();
        assert!(samples[0].abs() < 1e-6);
        assert!((samples[25] - 1.0).abs() < 1e-3);
        assert!((samples[75] + 1.0).abs() < 1e-3);
        assert!(osc.phase() < 1e-3 || osc.phase() > 0.999);
    }

    #[test]
    fn waveforms_stay_bipolar() {
        for wf in [Waveform::Sine, Waveform::Triangle, Waveform::Sawtooth, Waveform::Square] {
            let mut osc = Oscillator::new(48000.0, wf);
            for _ in 0..4800 {
                let v = osc.next(7.0);
                assert!((-1.0..=1.0).contains(&v), "{wf:?}: {v}");
            }
        }
    }

    #[test]
    fn negative_frequency_wraps() {
        let mut osc = Oscillator::new(48000.0, Waveform::Sawtooth);
        for _ in 0..100 {
            osc.next(-500.0);
            assert!((0.0..1.0).contains(&osc.phase()));
        }
    }
}
