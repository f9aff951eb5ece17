//! Effect snapshot types shared by effects, presets and the chain manager.
//!
//! A snapshot is `{ model, params }`: the effect's model name plus the
//! normalized control values it currently applies. Values are booleans
//! (`active`), numbers (knobs) or text (selector controls); in JSON they
//! appear untagged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One control value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// On/off control.
    Bool(bool),
    /// Normalized knob value.
    Number(f32),
    /// Named selection.
    Text(String),
}

impl ParamValue {
    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            ParamValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// The boolean value, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The text value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Number(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

/// Control values keyed by name, in a stable order.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Captured state of one effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    /// Model name the effect was created from.
    pub model: String,
    /// Current control values, including `active`.
    #[serde(default)]
    pub params: ParamMap,
}

impl EffectSnapshot {
    /// Snapshot of `model` with no params.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            params: ParamMap::new(),
        }
    }

    /// Builder-style param insertion.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Numeric param lookup.
    pub fn number(&self, name: &str) -> Option<f32> {
        self.params.get(name).and_then(ParamValue::as_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_shape() {
        let snap = EffectSnapshot::new("delay")
            .with_param("active", true)
            .with_param("mix", 0.5f32)
            .with_param("voicing", "dark");
        let json = serde_json::to_string(&snap).unwrap();
        assert_eq!(
            json,
            r#"{"model":"delay","params":{"active":true,"mix":0.5,"voicing":"dark"}}"#
        );
        let back: EffectSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn missing_params_default_to_empty() {
        let snap: EffectSnapshot = serde_json::from_str(r#"{"model":"tuner"}"#).unwrap();
        assert!(snap.params.is_empty());
    }

    #[test]
    fn accessors() {
        assert_eq!(ParamValue::Number(0.3).as_number(), Some(0.3));
        assert_eq!(ParamValue::Bool(true).as_number(), None);
        assert_eq!(ParamValue::Bool(false).as_bool(), Some(false));
        assert_eq!(ParamValue::from("x").as_text(), Some("x"));
    }
}
