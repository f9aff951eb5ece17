//! Distortion model table.
//!
//! Every drive pedal is the same chain with a different curve family; the
//! table maps the model names used in presets to those families.

use stomp_core::CurveFamily;

/// One selectable distortion voicing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistortionModel {
    /// Model name used in presets and the registry.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Waveshaper curve family.
    pub curve: CurveFamily,
    /// One-line description.
    pub description: &'static str,
}

/// All distortion models, in display order.
pub static DISTORTION_MODELS: [DistortionModel; 9] = [
    DistortionModel {
        id: "ds1",
        name: "DS-1",
        curve: CurveFamily::Classic,
        description: "Hard-edged distortion with a rational clip",
    },
    DistortionModel {
        id: "blues-driver",
        name: "Blues Driver",
        curve: CurveFamily::Blues,
        description: "Touch-sensitive steep tanh overdrive",
    },
    DistortionModel {
        id: "sunshine",
        name: "Sunshine",
        curve: CurveFamily::Sunshine,
        description: "Warm nested-tanh drive with even harmonics",
    },
    DistortionModel {
        id: "overdrive",
        name: "Overdrive",
        curve: CurveFamily::Driver,
        description: "Transparent overdrive with bounded gain",
    },
    DistortionModel {
        id: "sustainer",
        name: "Sustainer",
        curve: CurveFamily::Sustained,
        description: "Asymmetric compressing fuzz",
    },
    DistortionModel {
        id: "crunch",
        name: "Crunch",
        curve: CurveFamily::Tuna4,
        description: "Soft-knee amp crunch",
    },
    DistortionModel {
        id: "vintage",
        name: "Vintage",
        curve: CurveFamily::Tuna5,
        description: "Fixed asymmetric tube-style clip",
    },
    DistortionModel {
        id: "bitcrusher",
        name: "Bitcrusher",
        curve: CurveFamily::Tuna6,
        description: "Bit-depth quantizer",
    },
    DistortionModel {
        id: "harmonic",
        name: "Harmonic",
        curve: CurveFamily::Chebyshev,
        description: "Chebyshev harmonic generator",
    },
];

/// Look up a distortion model by id.
pub fn distortion_model(id: &str) -> Option<&'static DistortionModel> {
    DISTORTION_MODELS.iter().find(|model| model.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        for (i, a) in DISTORTION_MODELS.iter().enumerate() {
            for b in &DISTORTION_MODELS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn every_family_is_used_once() {
        for family in CurveFamily::ALL {
            let count = DISTORTION_MODELS
                .iter()
                .filter(|model| model.curve == family)
                .count();
            assert_eq!(count, 1, "{family}");
        }
    }

    #[test]
    fn lookup() {
        assert_eq!(distortion_model("ds1").map(|m| m.curve), Some(CurveFamily::Classic));
        assert!(distortion_model("tubescreamer").is_none());
    }
}
