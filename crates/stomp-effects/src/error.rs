//! Effect construction and loading errors.

use stomp_core::CurveError;

/// Errors raised while configuring an effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    /// A configured curve name does not match any curve family.
    #[error("unknown curve type: {0}")]
    UnknownCurve(String),

    /// An impulse response could not be decoded.
    #[error("impulse response decode failed: {0}")]
    ImpulseDecode(String),
}

impl From<CurveError> for EffectError {
    fn from(err: CurveError) -> Self {
        match err {
            CurveError::UnknownFamily(name) => EffectError::UnknownCurve(name),
        }
    }
}

impl From<hound::Error> for EffectError {
    fn from(err: hound::Error) -> Self {
        EffectError::ImpulseDecode(err.to_string())
    }
}

/// Result alias for effect configuration.
pub type Result<T> = std::result::Result<T, EffectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            EffectError::UnknownCurve("fuzzface".into()).to_string(),
            "unknown curve type: fuzzface"
        );
        assert_eq!(
            EffectError::ImpulseDecode("no samples".into()).to_string(),
            "impulse response decode failed: no samples"
        );
    }

    #[test]
    fn curve_error_maps_to_unknown_curve() {
        let err: EffectError = CurveError::UnknownFamily("x".into()).into();
        assert_eq!(err, EffectError::UnknownCurve("x".into()));
    }
}
