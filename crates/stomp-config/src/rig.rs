//! Rig configuration: audio settings and device selection, stored as TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Render quantum of the host graph; buffer sizes must be a multiple.
pub const RENDER_QUANTUM: u32 = 128;

/// Audio settings for a live rig.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// buffer_size = 256
/// tuner_interval_ms = 100
/// input_device = "USB Audio Interface"
/// master = 0.8
/// ```
///
/// Missing keys take their defaults; missing device labels mean the system
/// default device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Device buffer size in frames.
    pub buffer_size: u32,
    /// Tuner sampling cadence in milliseconds.
    pub tuner_interval_ms: u64,
    /// Input device label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Output device label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
    /// Master level, `0..1`.
    pub master: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 256,
            tuner_interval_ms: 100,
            input_device: None,
            output_device: None,
            master: 1.0,
        }
    }
}

impl RigConfig {
    /// Tuner cadence as a [`Duration`].
    pub fn tuner_interval(&self) -> Duration {
        Duration::from_millis(self.tuner_interval_ms)
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(8000..=192_000).contains(&self.sample_rate) {
            return Err(ConfigError::InvalidRig {
                field: "sample_rate",
                reason: format!("{} Hz is outside 8000..=192000", self.sample_rate),
            });
        }
        if self.buffer_size == 0 || self.buffer_size % RENDER_QUANTUM != 0 {
            return Err(ConfigError::InvalidRig {
                field: "buffer_size",
                reason: format!("must be a non-zero multiple of {RENDER_QUANTUM}"),
            });
        }
        if self.tuner_interval_ms == 0 {
            return Err(ConfigError::InvalidRig {
                field: "tuner_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.master) {
            return Err(ConfigError::InvalidRig {
                field: "master",
                reason: format!("{} is outside 0..=1", self.master),
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        std::fs::write(path, self.to_toml()?).map_err(|e| ConfigError::write_file(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RigConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tuner_interval(), Duration::from_millis(100));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = RigConfig::from_toml(
            r#"
            buffer_size = 512
            input_device = "USB Audio"
            "#,
        )
        .unwrap();
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.input_device.as_deref(), Some("USB Audio"));
        assert_eq!(config.output_device, None);
    }

    #[test]
    fn toml_round_trip() {
        let config = RigConfig {
            sample_rate: 44100,
            buffer_size: 128,
            tuner_interval_ms: 50,
            input_device: Some("In".into()),
            output_device: Some("Out".into()),
            master: 0.5,
        };
        let back = RigConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn bad_settings_are_rejected() {
        let field = |toml: &str| match RigConfig::from_toml(toml) {
            Err(ConfigError::InvalidRig { field, .. }) => field,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(field("buffer_size = 100"), "buffer_size");
        assert_eq!(field("buffer_size = 0"), "buffer_size");
        assert_eq!(field("sample_rate = 1000"), "sample_rate");
        assert_eq!(field("tuner_interval_ms = 0"), "tuner_interval_ms");
        assert_eq!(field("master = 1.5"), "master");
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            RigConfig::from_toml("sample_rate = \"fast\""),
            Err(ConfigError::TomlParse(_))
        ));
    }
}
