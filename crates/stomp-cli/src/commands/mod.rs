//! CLI command implementations.

pub mod common;
pub mod curve;
pub mod devices;
pub mod effects;
pub mod play;
pub mod presets;
pub mod render;
pub mod tune;
