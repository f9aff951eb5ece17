//! Time-domain autocorrelation pitch detection.
//!
//! The detector works on the analyser's byte view of a window (silence at
//! 128). For every lag `i` it computes the centered autocorrelation over the
//! overlapping part of the window,
//!
//! ```text
//! r(i) = Σ_k (b[k] − 128)(b[k + i] − 128) / 256
//! ```
//!
//! and walks a three-state peak finder over `r`:
//!
//! ```text
//! Init ──lag 0──▶ Rising ──r > r(0)/2 and rising──▶ Found ──r stops rising──▶ period
//! ```
//!
//! The first lag after the threshold crossing where `r` no longer increases is
//! the period; the scan stops there.

use crate::notes::{Note, find_closest_note};
use serde::{Deserialize, Serialize};

/// Fraction of `r(0)` the correlation must exceed before a peak counts.
pub const THRESHOLD_RATIO: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeakState {
    Init,
    Rising,
    Found,
}

/// Centered autocorrelation of `buf` at `lag`, normalized by 256.
fn autocorrelation(buf: &[u8], lag: usize) -> f32 {
    buf.iter()
        .zip(&buf[lag..])
        .map(|(&a, &b)| (f32::from(a) - 128.0) * (f32::from(b) - 128.0) / 256.0)
        .sum()
}

/// Fundamental period of `buf` in samples, or `None` if no peak is found.
pub fn detect_period(buf: &[u8]) -> Option<usize> {
    let mut state = PeakState::Init;
    let mut threshold = 0.0;
    let mut prev = 0.0;

    for lag in 0..buf.len() {
        let sum = autocorrelation(buf, lag);
        let slope = sum - prev;
        prev = sum;

        match state {
            PeakState::Init => {
                threshold = sum * THRESHOLD_RATIO;
                state = PeakState::Rising;
            }
            PeakState::Rising => {
                if sum > threshold && slope > 0.0 {
                    state = PeakState::Found;
                }
            }
            PeakState::Found => {
                if slope <= 0.0 {
                    return Some(lag);
                }
            }
        }
    }
    None
}

/// Fundamental frequency of `buf` in Hz, or `None` when there is no
/// periodic signal.
///
/// ```rust
/// use stomp_analysis::detect_pitch;
///
/// // one full cycle every 64 samples
/// let buf: Vec<u8> = (0..1024)
///     .map(|i| (128.0 + 100.0 * (std::f32::consts::TAU * i as f32 / 64.0).sin()) as u8)
///     .collect();
/// let hz = detect_pitch(&buf, 48000.0).unwrap();
/// assert!((hz - 750.0).abs() < 20.0);
///
/// assert_eq!(detect_pitch(&[128; 1024], 48000.0), None);
/// ```
pub fn detect_pitch(buf: &[u8], sample_rate: f32) -> Option<f32> {
    detect_period(buf).map(|period| sample_rate / period as f32)
}

/// Closest note and cent offset, or `{None, None}` when nothing was heard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerReading {
    /// Note name with octave, e.g. `"A4"`.
    pub note: Option<String>,
    /// Offset from the note, `floor(1200 · log2(f / note))`.
    pub cents: Option<i32>,
}

impl TunerReading {
    /// The "no signal" reading.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Reading for a detected frequency.
    pub fn from_frequency(frequency: f32) -> Self {
        match find_closest_note(frequency) {
            Some(note) => Self {
                note: Some(note.name()),
                cents: Some(cents_off(frequency, note)),
            },
            None => Self::silent(),
        }
    }

    /// Whether a note was detected.
    pub fn is_silent(&self) -> bool {
        self.note.is_none()
    }
}

/// `floor(1200 · log2(frequency / note))`.
pub fn cents_off(frequency: f32, note: &Note) -> i32 {
    (1200.0 * (frequency / note.frequency).log2()).floor() as i32
}

/// Detect the pitch of `buf` and match it against the note table.
pub fn analyse(buf: &[u8], sample_rate: f32) -> TunerReading {
    match detect_pitch(buf, sample_rate) {
        Some(frequency) => TunerReading::from_frequency(frequency),
        None => TunerReading::silent(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periodic(len: usize, period: f32) -> Vec<u8> {
        (0..len)
            .map(|i| (128.0 + 90.0 * (std::f32::consts::TAU * i as f32 / period).sin()) as u8)
            .collect()
    }

    /// Deterministic byte noise from a xorshift generator.
    fn noise(len: usize) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state >> 24) as u8
            })
            .collect()
    }

    #[test]
    fn periodic_signal_gives_its_period() {
        for period in [40.0, 100.0, 218.0] {
            let buf = periodic(2048, period);
            let found = detect_period(&buf).unwrap() as f32;
            assert!((found - period).abs() <= 2.0, "{found} vs {period}");
        }
    }

    #[test]
    fn frequency_is_rate_over_period() {
        let buf = periodic(2048, 100.0);
        let hz = detect_pitch(&buf, 44100.0).unwrap();
        assert!((hz - 441.0).abs() / 441.0 < 0.02, "{hz}");
    }

    #[test]
    fn noise_has_no_pitch() {
        assert_eq!(detect_pitch(&noise(2048), 48000.0), None);
    }

    #[test]
    fn silence_has_no_pitch() {
        assert_eq!(detect_pitch(&[128; 2048], 48000.0), None);
        assert_eq!(detect_pitch(&[], 48000.0), None);
        assert_eq!(analyse(&[128; 512], 48000.0), TunerReading::silent());
    }

    #[test]
    fn reading_for_exact_note() {
        let reading = TunerReading::from_frequency(440.0);
        assert_eq!(reading.note.as_deref(), Some("A4"));
        assert_eq!(reading.cents, Some(0));
    }

    #[test]
    fn reading_cents_are_floored() {
        // a touch flat of A4 lands on -1, not 0
        let reading = TunerReading::from_frequency(439.9);
        assert_eq!(reading.note.as_deref(), Some("A4"));
        assert_eq!(reading.cents, Some(-1));
    }

    #[test]
    fn reading_json_shape() {
        let json = serde_json::to_string(&TunerReading::silent()).unwrap();
        assert_eq!(json, r#"{"note":null,"cents":null}"#);
    }
}
