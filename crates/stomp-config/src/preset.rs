//! Preset document and its JSON codec.

use serde::{Deserialize, Serialize};
use std::path::Path;
use stomp_core::{EffectSnapshot, ParamValue};

use crate::error::ConfigError;

/// Cabinet param carrying the rig's master level.
pub const MASTER_PARAM: &str = "master";

/// A saved rig: the cabinet plus the pedals in chain order.
///
/// # JSON Format
///
/// ```json
/// {
///   "id": "crunch-rhythm",
///   "cabinet": { "model": "cabinet", "params": { "active": true, "master": 0.8, "tone": 0.4 } },
///   "pedals": [
///     { "model": "compressor", "params": { "active": true, "threshold": 0.5 } },
///     { "model": "ds1", "params": { "active": true, "distortion": 0.7 } }
///   ]
/// }
/// ```
///
/// `pedals` never contains the cabinet. A preset without a cabinet omits the
/// key and keeps its master level in a top-level `"master"` field instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Preset identifier.
    pub id: String,

    /// Terminal effect, with `master` merged into its params.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabinet: Option<EffectSnapshot>,

    /// Non-terminal effects in chain order.
    #[serde(default)]
    pub pedals: Vec<EffectSnapshot>,

    /// Master level of a preset with no cabinet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<f32>,
}

impl Preset {
    /// Create an empty preset.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cabinet: None,
            pedals: Vec::new(),
            master: None,
        }
    }

    /// Set the cabinet snapshot. A top-level master moves onto it.
    pub fn with_cabinet(mut self, cabinet: EffectSnapshot) -> Self {
        self.cabinet = Some(cabinet);
        if let Some(master) = self.master.take() {
            self.set_master(master);
        }
        self
    }

    /// Append a pedal snapshot.
    pub fn with_pedal(mut self, pedal: EffectSnapshot) -> Self {
        self.pedals.push(pedal);
        self
    }

    /// Master level: the cabinet's `master` param, else the top-level field.
    pub fn master(&self) -> Option<f32> {
        self.cabinet
            .as_ref()
            .and_then(|cab| cab.number(MASTER_PARAM))
            .or(self.master)
    }

    /// Store `master` on the cabinet, or at top level when there is none.
    pub fn set_master(&mut self, master: f32) {
        match self.cabinet.as_mut() {
            Some(cab) => {
                cab.params
                    .insert(MASTER_PARAM.to_string(), ParamValue::Number(master));
                self.master = None;
            }
            None => self.master = Some(master),
        }
    }

    /// Pedals followed by the cabinet, the order a chain is built in.
    pub fn chain(&self) -> impl Iterator<Item = &EffectSnapshot> {
        self.pedals.iter().chain(self.cabinet.as_ref())
    }

    /// Parse a preset from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a preset from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset = Self::from_json(&content)?;
        tracing::info!(id = %preset.id, path = %path.display(), "preset loaded");
        Ok(preset)
    }

    /// Save the preset to a JSON file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        std::fs::write(path, self.to_json()?).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::info!(id = %self.id, path = %path.display(), "preset saved");
        Ok(())
    }

    /// Number of effects, cabinet included.
    pub fn len(&self) -> usize {
        self.pedals.len() + usize::from(self.cabinet.is_some())
    }

    /// Whether the preset holds no effects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Preset {
        Preset::new("crunch")
            .with_pedal(EffectSnapshot::new("compressor").with_param("threshold", 0.5f32))
            .with_pedal(
                EffectSnapshot::new("ds1")
                    .with_param("active", false)
                    .with_param("distortion", 0.75f32),
            )
            .with_cabinet(EffectSnapshot::new("cabinet").with_param("master", 0.8f32))
    }

    #[test]
    fn json_shape() {
        let preset = Preset::new("p")
            .with_pedal(EffectSnapshot::new("delay").with_param("mix", 0.25f32))
            .with_cabinet(EffectSnapshot::new("cabinet").with_param("master", 1.0f32));
        let value: serde_json::Value = serde_json::from_str(&preset.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "p",
                "cabinet": { "model": "cabinet", "params": { "master": 1.0 } },
                "pedals": [ { "model": "delay", "params": { "mix": 0.25 } } ]
            })
        );
    }

    #[test]
    fn json_round_trip() {
        let preset = sample();
        let back = Preset::from_json(&preset.to_json().unwrap()).unwrap();
        assert_eq!(back, preset);
    }

    #[test]
    fn missing_cabinet_and_pedals() {
        let preset = Preset::from_json(r#"{"id":"empty"}"#).unwrap();
        assert!(preset.is_empty());
        assert_eq!(preset.master(), None);
        assert!(!preset.to_json().unwrap().contains("cabinet"));
    }

    #[test]
    fn master_lives_on_cabinet() {
        let mut preset = sample();
        assert_eq!(preset.master(), Some(0.8));
        preset.set_master(0.3);
        assert_eq!(preset.master(), Some(0.3));
        assert_eq!(preset.master, None);
    }

    #[test]
    fn master_without_cabinet_is_top_level() {
        let mut bare = Preset::new("bare")
            .with_pedal(EffectSnapshot::new("delay").with_param("mix", 0.25f32));
        bare.set_master(0.5);
        assert_eq!(bare.master(), Some(0.5));

        let value: serde_json::Value = serde_json::from_str(&bare.to_json().unwrap()).unwrap();
        assert_eq!(value["master"], serde_json::json!(0.5f32));
        assert_eq!(Preset::from_json(&bare.to_json().unwrap()).unwrap().master(), Some(0.5));

        let moved = bare.with_cabinet(EffectSnapshot::new("cabinet"));
        assert_eq!(moved.master, None);
        assert_eq!(moved.master(), Some(0.5));
    }

    #[test]
    fn chain_order_puts_cabinet_last() {
        let preset = sample();
        let models: Vec<&str> = preset.chain().map(|s| s.model.as_str()).collect();
        assert_eq!(models, ["compressor", "ds1", "cabinet"]);
        assert_eq!(preset.len(), 3);
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            Preset::from_json("{\"pedals\": 3}"),
            Err(ConfigError::Json(_))
        ));
    }
}
