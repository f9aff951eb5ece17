//! Preset validation against the effect registry.
//!
//! Numeric values are never range-checked: every setter clamps, so an out of
//! range knob still loads. What fails is structure: unknown models, unknown
//! controls, a value of the wrong kind, or a terminal effect in the wrong
//! slot.
//!
//! # Example
//!
//! ```rust
//! use stomp_config::{Preset, validate_preset};
//! use stomp_core::EffectSnapshot;
//! use stomp_registry::EffectRegistry;
//!
//! let registry = EffectRegistry::new();
//! let preset = Preset::new("clean")
//!     .with_pedal(EffectSnapshot::new("chorus").with_param("rate", 0.3f32));
//! assert!(validate_preset(&preset, &registry).is_ok());
//! ```

use crate::preset::{MASTER_PARAM, Preset};
use stomp_core::{CurveFamily, EffectSnapshot, ParamValue};
use stomp_registry::EffectRegistry;
use thiserror::Error;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Unknown effect model.
    #[error("unknown effect type: {0}")]
    UnknownEffect(String),

    /// Unknown parameter name.
    #[error("unknown parameter '{param}' for effect '{effect}'")]
    UnknownParameter {
        /// Model of the effect.
        effect: String,
        /// Name of the unrecognized parameter.
        param: String,
    },

    /// Value of the wrong kind for its parameter.
    #[error("invalid value for parameter '{param}' of '{effect}': {reason}")]
    InvalidValue {
        /// Model of the effect.
        effect: String,
        /// Name of the parameter.
        param: String,
        /// Description of the problem.
        reason: String,
    },

    /// The cabinet slot holds a non-terminal effect.
    #[error("'{0}' cannot be used as the cabinet")]
    NotTerminal(String),

    /// A terminal effect appears among the pedals.
    #[error("'{0}' must be the cabinet, not a pedal")]
    MisplacedTerminal(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Check every snapshot in `preset` against `registry`.
///
/// All problems are collected; more than one is reported as
/// [`ValidationError::Multiple`].
pub fn validate_preset(preset: &Preset, registry: &EffectRegistry) -> ValidationResult<()> {
    let mut errors = Vec::new();

    for pedal in &preset.pedals {
        match registry.get(&pedal.model) {
            None => errors.push(ValidationError::UnknownEffect(pedal.model.clone())),
            Some(d) if d.terminal => {
                errors.push(ValidationError::MisplacedTerminal(pedal.model.clone()));
            }
            Some(_) => check_params(pedal, registry, &[], &mut errors),
        }
    }

    if let Some(cabinet) = &preset.cabinet {
        match registry.get(&cabinet.model) {
            None => errors.push(ValidationError::UnknownEffect(cabinet.model.clone())),
            Some(d) if !d.terminal => {
                errors.push(ValidationError::NotTerminal(cabinet.model.clone()));
            }
            Some(_) => check_params(cabinet, registry, &[MASTER_PARAM], &mut errors),
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

fn check_params(
    snapshot: &EffectSnapshot,
    registry: &EffectRegistry,
    extra: &[&str],
    errors: &mut Vec<ValidationError>,
) {
    let Some(known) = registry.param_names(&snapshot.model) else {
        errors.push(ValidationError::UnknownEffect(snapshot.model.clone()));
        return;
    };
    for (name, value) in &snapshot.params {
        if !known.contains(name) && !extra.contains(&name.as_str()) {
            errors.push(ValidationError::UnknownParameter {
                effect: snapshot.model.clone(),
                param: name.clone(),
            });
            continue;
        }
        if let Err(reason) = check_value(name, value) {
            errors.push(ValidationError::InvalidValue {
                effect: snapshot.model.clone(),
                param: name.clone(),
                reason,
            });
        }
    }
}

fn check_value(name: &str, value: &ParamValue) -> Result<(), String> {
    match (name, value) {
        ("active", ParamValue::Bool(_)) => Ok(()),
        ("active", _) => Err("expected a boolean".to_string()),
        ("curve", ParamValue::Text(curve)) => curve
            .parse::<CurveFamily>()
            .map(|_| ())
            .map_err(|e| e.to_string()),
        ("curve", _) => Err("expected a curve name".to_string()),
        (_, ParamValue::Number(v)) if v.is_finite() => Ok(()),
        (_, ParamValue::Number(_)) => Err("not a finite number".to_string()),
        _ => Err("expected a number".to_string()),
    }
}
