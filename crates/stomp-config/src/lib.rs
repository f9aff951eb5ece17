//! Presets and rig configuration for the stomp guitar rig.
//!
//! - [`Preset`] - a saved chain as JSON: cabinet plus pedals in order
//! - [`validate_preset`] - structural checks against the [`stomp_registry::EffectRegistry`]
//! - [`factory_presets`] - bundled starting points in the same format
//! - [`RigConfig`] - sample rate, buffer size, devices and master level as TOML
//!
//! # Example
//!
//! ```rust
//! use stomp_config::{Preset, RigConfig};
//! use stomp_core::EffectSnapshot;
//!
//! let preset = Preset::new("clean")
//!     .with_pedal(EffectSnapshot::new("compressor"))
//!     .with_cabinet(EffectSnapshot::new("cabinet").with_param("master", 0.8f32));
//! let json = preset.to_json().unwrap();
//! assert_eq!(Preset::from_json(&json).unwrap(), preset);
//!
//! let rig = RigConfig::from_toml("buffer_size = 512").unwrap();
//! assert_eq!(rig.sample_rate, 48000);
//! ```

pub mod error;
pub mod factory_presets;
pub mod preset;
pub mod rig;
pub mod validation;

pub use error::ConfigError;
pub use factory_presets::{factory_preset, factory_preset_names, factory_presets};
pub use preset::{MASTER_PARAM, Preset};
pub use rig::{RENDER_QUANTUM, RigConfig};
pub use validation::{ValidationError, ValidationResult, validate_preset};
