//! Effect listing and information command.

#![allow(clippy::print_literal)]

use clap::Args;
use stomp_core::{AudioContext, Effect, ParamMap};
use stomp_registry::{EffectCategory, EffectRegistry};

#[derive(Args)]
pub struct EffectsArgs {
    /// Show default controls for a specific effect
    #[arg(value_name = "EFFECT")]
    effect: Option<String>,
}

pub fn run(args: EffectsArgs) -> anyhow::Result<()> {
    let registry = EffectRegistry::new();

    if let Some(id) = &args.effect {
        let descriptor = registry
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect: {}", id))?;

        println!("{} ({})", descriptor.name, descriptor.id);
        println!("{}", "=".repeat(descriptor.name.len() + descriptor.id.len() + 3));
        println!();
        println!("{}", descriptor.description);
        if descriptor.terminal {
            println!("Always placed last in the chain.");
        }
        println!();

        let defaults = default_params(&registry, descriptor.id)?;
        println!("  {:12}  {}", "Control", "Default");
        println!("  {:12}  {}", "-------", "-------");
        for (name, value) in &defaults {
            println!("  {:12}  {}", name, serde_json::to_string(value)?);
        }
        return Ok(());
    }

    println!("Available Effects");
    println!("=================\n");
    for category in EffectCategory::ALL {
        let effects = registry.effects_in_category(category);
        if effects.is_empty() {
            continue;
        }
        println!("{}:", category.name());
        for descriptor in effects {
            println!("  {:14}  {}", descriptor.id, descriptor.description);
        }
        println!();
    }
    println!("Use 'stomp effects <EFFECT>' for default control values.");

    Ok(())
}

/// Controls of a freshly built instance, `active` included.
fn default_params(registry: &EffectRegistry, id: &str) -> anyhow::Result<ParamMap> {
    let ctx = AudioContext::new(48000.0);
    let mut effect = registry
        .create(id, &ctx)
        .ok_or_else(|| anyhow::anyhow!("Cannot build effect: {}", id))?;
    let params = effect.take_snapshot().params;
    effect.dispose();
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_active_flag() {
        let registry = EffectRegistry::new();
        let params = default_params(&registry, "tremolo").unwrap();
        assert!(params.contains_key("active"));
        assert!(params.contains_key("speed"));
        assert!(params.contains_key("depth"));
    }

    #[test]
    fn unknown_effect_is_an_error() {
        let registry = EffectRegistry::new();
        assert!(default_params(&registry, "wah").is_err());
    }
}
