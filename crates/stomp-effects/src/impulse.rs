//! Impulse responses for the convolution effects.
//!
//! Loaded and generated responses are scaled to unit energy before they reach
//! a convolver, so swapping responses does not jump the level.

use crate::error::{EffectError, Result};
use hound::{SampleFormat, WavReader};
use libm::{expf, powf, sinf};
use std::f32::consts::TAU;
use std::io::Cursor;

/// Decode a WAV file held in memory to mono `f32` samples.
///
/// Multi-channel files are averaged down to mono.
pub fn decode_wav(bytes: &[u8]) -> Result<Vec<f32>> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let mono: Vec<f32> = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    if mono.is_empty() {
        return Err(EffectError::ImpulseDecode("no samples".into()));
    }
    Ok(mono)
}

/// Scale `impulse` to unit energy. Silent responses are left alone.
pub fn normalize(impulse: &mut [f32]) {
    let energy: f32 = impulse.iter().map(|h| h * h).sum();
    if energy > 1e-12 {
        let scale = 1.0 / energy.sqrt();
        for h in impulse.iter_mut() {
            *h *= scale;
        }
    }
}

/// Decode and normalize a WAV impulse response.
pub fn load_impulse(bytes: &[u8]) -> Result<Vec<f32>> {
    let mut impulse = decode_wav(bytes)?;
    normalize(&mut impulse);
    Ok(impulse)
}

/// Synthetic closed-back 4x12 response.
///
/// A low cabinet thump and a speaker cone resonance, both damped within a
/// few tens of milliseconds.
pub fn cabinet_impulse(sample_rate: f32) -> Vec<f32> {
    let len = (sample_rate * 0.04).round() as usize;
    let mut impulse: Vec<f32> = (0..len.max(1))
        .map(|i| {
            let t = i as f32 / sample_rate;
            let body = 0.6 * expf(-t * 90.0) * sinf(TAU * 110.0 * t);
            let cone = 0.4 * expf(-t * 400.0) * sinf(TAU * 2400.0 * t);
            let click = if i == 0 { 1.0 } else { 0.0 };
            click + body + cone
        })
        .collect();
    normalize(&mut impulse);
    impulse
}

/// Decaying-noise room response, `noise · (1 − t/len)^decay`.
///
/// The noise comes from a fixed-seed generator so the response is the same
/// on every run.
pub fn reverb_impulse(sample_rate: f32, seconds: f32, decay: f32) -> Vec<f32> {
    let len = ((sample_rate * seconds).round() as usize).max(1);
    let mut state: u32 = 0x9E37_79B9;
    let mut impulse: Vec<f32> = (0..len)
        .map(|i| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (state >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0;
            noise * powf(1.0 - i as f32 / len as f32, decay)
        })
        .collect();
    normalize(&mut impulse);
    impulse
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn wav_bytes(samples: &[i16], channels: u16) -> Vec<u8> {
        let spec = WavSpec {
            channels,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    fn energy(impulse: &[f32]) -> f32 {
        impulse.iter().map(|h| h * h).sum()
    }

    #[test]
    fn decodes_int_wav() {
        let bytes = wav_bytes(&[16384, -16384, 0], 1);
        let samples = decode_wav(&bytes).unwrap();
        assert_eq!(samples, vec![0.5, -0.5, 0.0]);
    }

    #[test]
    fn stereo_is_averaged() {
        let bytes = wav_bytes(&[16384, 0, 0, -16384], 2);
        assert_eq!(decode_wav(&bytes).unwrap(), vec![0.25, -0.25]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_wav(b"definitely not a wav file").unwrap_err();
        assert!(matches!(err, EffectError::ImpulseDecode(_)));
    }

    #[test]
    fn empty_wav_is_a_decode_error() {
        let bytes = wav_bytes(&[], 1);
        assert_eq!(
            decode_wav(&bytes),
            Err(EffectError::ImpulseDecode("no samples".into()))
        );
    }

    #[test]
    fn loaded_impulse_has_unit_energy() {
        let bytes = wav_bytes(&[8000, 4000, -2000], 1);
        let impulse = load_impulse(&bytes).unwrap();
        assert!((energy(&impulse) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn generated_responses() {
        let cab = cabinet_impulse(48000.0);
        assert_eq!(cab.len(), 1920);
        assert!((energy(&cab) - 1.0).abs() < 1e-3);

        let room = reverb_impulse(48000.0, 0.5, 2.0);
        assert_eq!(room.len(), 24000);
        assert!((energy(&room) - 1.0).abs() < 1e-3);
        assert_eq!(room, reverb_impulse(48000.0, 0.5, 2.0));
        // tail decays
        let head: f32 = room[..2400].iter().map(|h| h.abs()).sum();
        let tail: f32 = room[21600..].iter().map(|h| h.abs()).sum();
        assert!(tail < head * 0.05);
    }

    #[test]
    fn silent_impulse_stays_silent() {
        let mut impulse = vec![0.0; 8];
        normalize(&mut impulse);
        assert!(impulse.iter().all(|h| *h == 0.0));
    }
}
