//! Effect registry and factory for the stomp guitar rig.
//!
//! The registry knows every built-in model by its id, the same string an
//! effect reports from [`Effect::model`] and a preset stores in its
//! snapshots. It creates ready-to-wire [`Pedal`]s and carries the metadata a
//! front end needs to list them.
//!
//! # Example
//!
//! ```rust
//! use stomp_core::{AudioContext, Effect};
//! use stomp_registry::{EffectCategory, EffectRegistry};
//!
//! let registry = EffectRegistry::new();
//! let ctx = AudioContext::new(48000.0);
//!
//! let cabinet = registry.create("cabinet", &ctx).unwrap();
//! assert!(cabinet.is_terminal());
//!
//! for effect in registry.effects_in_category(EffectCategory::Modulation) {
//!     println!("{}: {}", effect.name, effect.description);
//! }
//! ```

use stomp_core::{AudioContext, Effect, EffectSnapshot};
use stomp_effects::{
    Cabinet, Chorus, Compressor, DISTORTION_MODELS, Delay, Distortion, DistortionModel, Muff,
    Pedal, Phaser, Reverb, Tremolo, Tuner,
};

/// Category of effect for organization and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectCategory {
    /// Compressors.
    Dynamics,
    /// Drive, fuzz and waveshaping.
    Distortion,
    /// Chorus, phaser, tremolo.
    Modulation,
    /// Delay and reverb.
    TimeBased,
    /// Cabinets and amp voicing.
    Amp,
    /// Tuner.
    Utility,
}

impl EffectCategory {
    /// Every category, in display order.
    pub const ALL: [EffectCategory; 6] = [
        EffectCategory::Dynamics,
        EffectCategory::Distortion,
        EffectCategory::Modulation,
        EffectCategory::TimeBased,
        EffectCategory::Amp,
        EffectCategory::Utility,
    ];

    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            EffectCategory::Dynamics => "Dynamics",
            EffectCategory::Distortion => "Distortion",
            EffectCategory::Modulation => "Modulation",
            EffectCategory::TimeBased => "Time-Based",
            EffectCategory::Amp => "Amp",
            EffectCategory::Utility => "Utility",
        }
    }

    /// Returns a description of the category.
    pub const fn description(&self) -> &'static str {
        match self {
            EffectCategory::Dynamics => "Compressors and other dynamics processors",
            EffectCategory::Distortion => "Overdrive, distortion, fuzz and waveshaping pedals",
            EffectCategory::Modulation => "Chorus, phaser, tremolo and other modulation pedals",
            EffectCategory::TimeBased => "Delay, reverb and other time-based pedals",
            EffectCategory::Amp => "Speaker cabinets; always last in a chain",
            EffectCategory::Utility => "Tuners and other non-processing pedals",
        }
    }
}

/// Describes an effect in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDescriptor {
    /// Model id, as stored in snapshots.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Brief description of the effect.
    pub description: &'static str,
    /// Category for organization.
    pub category: EffectCategory,
    /// Whether the effect must sit at the end of a chain.
    pub terminal: bool,
}

enum Factory {
    Plain(fn(&AudioContext) -> Pedal),
    Voiced(&'static DistortionModel),
}

struct RegistryEntry {
    descriptor: EffectDescriptor,
    factory: Factory,
}

/// Registry of all built-in effects.
pub struct EffectRegistry {
    entries: Vec<RegistryEntry>,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.descriptor.id))
            .finish()
    }
}

impl EffectRegistry {
    /// Create a new registry with all built-in effects registered.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::with_capacity(9 + DISTORTION_MODELS.len()),
        };
        registry.register_builtin_effects();
        registry
    }

    fn register_builtin_effects(&mut self) {
        self.register(
            EffectDescriptor {
                id: Compressor::MODEL,
                name: "Compressor",
                description: "Dynamics compressor with makeup gain",
                category: EffectCategory::Dynamics,
                terminal: false,
            },
            Factory::Plain(|ctx| Compressor::new(ctx).into()),
        );

        for voicing in &DISTORTION_MODELS {
            self.register(
                EffectDescriptor {
                    id: voicing.id,
                    name: voicing.name,
                    description: voicing.description,
                    category: EffectCategory::Distortion,
                    terminal: false,
                },
                Factory::Voiced(voicing),
            );
        }

        self.register(
            EffectDescriptor {
                id: Muff::MODEL,
                name: "Muff",
                description: "Fuzz with a passive two-band tone stack",
                category: EffectCategory::Distortion,
                terminal: false,
            },
            Factory::Plain(|ctx| Muff::new(ctx).into()),
        );

        self.register(
            EffectDescriptor {
                id: Chorus::MODEL,
                name: "Chorus",
                description: "LFO-swept delay blended with the dry signal",
                category: EffectCategory::Modulation,
                terminal: false,
            },
            Factory::Plain(|ctx| Chorus::new(ctx).into()),
        );

        self.register(
            EffectDescriptor {
                id: Phaser::MODEL,
                name: "Phaser",
                description: "Four-stage swept allpass phaser",
                category: EffectCategory::Modulation,
                terminal: false,
            },
            Factory::Plain(|ctx| Phaser::new(ctx).into()),
        );

        self.register(
            EffectDescriptor {
                id: Tremolo::MODEL,
                name: "Tremolo",
                description: "LFO-driven amplitude modulation",
                category: EffectCategory::Modulation,
                terminal: false,
            },
            Factory::Plain(|ctx| Tremolo::new(ctx).into()),
        );

        self.register(
            EffectDescriptor {
                id: Delay::MODEL,
                name: "Delay",
                description: "Feedback delay with darkening repeats",
                category: EffectCategory::TimeBased,
                terminal: false,
            },
            Factory::Plain(|ctx| Delay::new(ctx).into()),
        );

        self.register(
            EffectDescriptor {
                id: Reverb::MODEL,
                name: "Reverb",
                description: "Convolution reverb with a generated room",
                category: EffectCategory::TimeBased,
                terminal: false,
            },
            Factory::Plain(|ctx| Reverb::new(ctx).into()),
        );

        self.register(
            EffectDescriptor {
                id: Cabinet::MODEL,
                name: "Cabinet",
                description: "Convolution speaker cabinet with tone stack",
                category: EffectCategory::Amp,
                terminal: true,
            },
            Factory::Plain(|ctx| Cabinet::new(ctx).into()),
        );

        self.register(
            EffectDescriptor {
                id: Tuner::MODEL,
                name: "Tuner",
                description: "Chromatic tuner, starts bypassed",
                category: EffectCategory::Utility,
                terminal: false,
            },
            Factory::Plain(|ctx| Tuner::new(ctx).into()),
        );
    }

    fn register(&mut self, descriptor: EffectDescriptor, factory: Factory) {
        self.entries.push(RegistryEntry {
            descriptor,
            factory,
        });
    }

    /// Returns descriptors for all registered effects.
    pub fn all_effects(&self) -> Vec<&EffectDescriptor> {
        self.entries.iter().map(|e| &e.descriptor).collect()
    }

    /// Returns descriptors for effects in a specific category.
    pub fn effects_in_category(&self, category: EffectCategory) -> Vec<&EffectDescriptor> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.category == category)
            .map(|e| &e.descriptor)
            .collect()
    }

    /// Get a descriptor by model id.
    pub fn get(&self, id: &str) -> Option<&EffectDescriptor> {
        self.entries
            .iter()
            .find(|e| e.descriptor.id == id)
            .map(|e| &e.descriptor)
    }

    /// Create an effect by model id, wired engaged (the tuner starts bypassed).
    ///
    /// The cabinet comes with its built-in impulse response installed.
    /// Returns `None` for unknown ids.
    pub fn create(&self, id: &str, ctx: &AudioContext) -> Option<Pedal> {
        let entry = self.entries.iter().find(|e| e.descriptor.id == id)?;
        let pedal = match entry.factory {
            Factory::Plain(build) => build(ctx),
            Factory::Voiced(voicing) => Distortion::new(ctx, voicing).into(),
        };
        Some(pedal)
    }

    /// Create an effect from a snapshot and restore its params.
    ///
    /// Unknown models yield `None`; unknown params are skipped.
    pub fn from_snapshot(&self, snapshot: &EffectSnapshot, ctx: &AudioContext) -> Option<Pedal> {
        let Some(mut pedal) = self.create(&snapshot.model, ctx) else {
            tracing::warn!(model = %snapshot.model, "unknown model in snapshot");
            return None;
        };
        pedal.restore(&snapshot.params);
        Some(pedal)
    }

    /// Names of every control `id` accepts, `active` included.
    ///
    /// Builds a throwaway instance on a private graph to read them.
    pub fn param_names(&self, id: &str) -> Option<Vec<String>> {
        let ctx = AudioContext::new(48000.0);
        let mut pedal = self.create(id, &ctx)?;
        let mut names: Vec<String> = pedal.take_snapshot().params.into_keys().collect();
        pedal.dispose();
        names.sort();
        Some(names)
    }

    /// Returns the number of registered effects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no effects are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
