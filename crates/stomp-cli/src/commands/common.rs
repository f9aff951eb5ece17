//! Shared CLI helpers used across multiple commands.

use stomp_config::{Preset, factory_preset, factory_preset_names};
use std::path::Path;

/// Load a preset by factory name or JSON file path.
///
/// Factory names win over paths so `stomp render in.wav out.wav --preset
/// crunch` never touches the filesystem.
pub fn load_preset(name: &str) -> anyhow::Result<Preset> {
    if let Some(preset) = factory_preset(name) {
        return Ok(preset);
    }

    let path = Path::new(name);
    if path.exists() {
        return Ok(Preset::load(path)?);
    }

    anyhow::bail!(
        "Preset '{}' not found. Factory presets: {}",
        name,
        factory_preset_names().join(", ")
    )
}

/// Quantize samples the way the analyser node does: `floor(128 · (1 + x))`.
pub fn to_bytes(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .map(|x| (128.0 * (1.0 + x)).floor().clamp(0.0, 255.0) as u8)
        .collect()
}

/// Root mean square of a block.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples.iter().map(|s| s * s).sum();
    (sum / samples.len() as f32).sqrt()
}

/// Largest absolute sample.
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}
