//! Factory presets bundled with the rig.
//!
//! Stored as JSON in the same format users save, so they double as format
//! examples.

use crate::Preset;

/// JSON content of every factory preset, by id.
static FACTORY_PRESETS_JSON: &[(&str, &str)] = &[
    ("clean", CLEAN_PRESET),
    ("crunch", CRUNCH_PRESET),
    ("fuzz-lead", FUZZ_LEAD_PRESET),
    ("ambient", AMBIENT_PRESET),
];

const CLEAN_PRESET: &str = r#"{
  "id": "clean",
  "cabinet": { "model": "cabinet", "params": { "active": true, "master": 0.8, "volume": 0.7, "tone": 0.6 } },
  "pedals": [
    { "model": "tuner", "params": { "active": false } },
    { "model": "compressor", "params": { "active": true, "threshold": 0.6, "ratio": 0.15, "volume": 0.3 } },
    { "model": "chorus", "params": { "active": true, "rate": 0.3, "depth": 0.4, "delay": 0.3 } }
  ]
}"#;

const CRUNCH_PRESET: &str = r#"{
  "id": "crunch",
  "cabinet": { "model": "cabinet", "params": { "active": true, "master": 0.7, "volume": 0.7, "tone": 0.45 } },
  "pedals": [
    { "model": "compressor", "params": { "active": true, "threshold": 0.5, "ratio": 0.25 } },
    { "model": "crunch", "params": { "active": true, "distortion": 0.55, "tone": 0.5, "volume": 0.6 } }
  ]
}"#;

const FUZZ_LEAD_PRESET: &str = r#"{
  "id": "fuzz-lead",
  "cabinet": { "model": "cabinet", "params": { "active": true, "master": 0.6, "volume": 0.6, "tone": 0.35 } },
  "pedals": [
    { "model": "muff", "params": { "active": true, "curve": "sustained", "sustain": 0.8, "tone": 0.4, "volume": 0.5 } },
    { "model": "delay", "params": { "active": true, "time": 0.35, "feedback": 0.3, "tone": 0.4, "mix": 0.25 } }
  ]
}"#;

const AMBIENT_PRESET: &str = r#"{
  "id": "ambient",
  "cabinet": { "model": "cabinet", "params": { "active": true, "master": 0.7, "volume": 0.7, "tone": 0.5 } },
  "pedals": [
    { "model": "tremolo", "params": { "active": true, "speed": 0.2, "depth": 0.3 } },
    { "model": "delay", "params": { "active": true, "time": 0.6, "feedback": 0.6, "tone": 0.3, "mix": 0.4 } },
    { "model": "reverb", "params": { "active": true, "level": 0.5, "tone": 0.4 } }
  ]
}"#;

/// Ids of every factory preset.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESETS_JSON.iter().map(|(id, _)| *id).collect()
}

/// Every factory preset that parses.
pub fn factory_presets() -> Vec<Preset> {
    FACTORY_PRESETS_JSON
        .iter()
        .filter_map(|(id, json)| match Preset::from_json(json) {
            Ok(preset) => Some(preset),
            Err(err) => {
                tracing::warn!(id = %id, error = %err, "factory preset failed to parse");
                None
            }
        })
        .collect()
}

/// Factory preset by id, case-insensitive.
pub fn factory_preset(id: &str) -> Option<Preset> {
    let (_, json) = FACTORY_PRESETS_JSON
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(id))?;
    Preset::from_json(json).ok()
}
