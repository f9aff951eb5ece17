//! Live playback command.

use crate::commands::common::load_preset;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use stomp_analysis::TunerReading;
use stomp_config::RigConfig;
use stomp_core::{AudioContext, Effect, EffectId};
use stomp_effects::Tuner;
use stomp_io::{CpalBackend, DeviceBackend};
use stomp_registry::EffectRegistry;
use stomp_rig::ChainManager;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const INPUT_WAIT: Duration = Duration::from_secs(5);

#[derive(Args)]
pub struct PlayArgs {
    /// Factory preset name or preset JSON file
    #[arg(short, long, default_value = "clean")]
    preset: String,

    /// Rig settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input device label, or part of one
    #[arg(short, long)]
    input: Option<String>,

    /// Output device label, or part of one
    #[arg(short, long)]
    output: Option<String>,

    /// Override the master level (0..1)
    #[arg(long)]
    master: Option<f32>,

    /// Engage the tuner and print readings
    #[arg(long)]
    tuner: bool,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };
    if args.input.is_some() {
        config.input_device = args.input.clone();
    }
    if args.output.is_some() {
        config.output_device = args.output.clone();
    }

    let preset = load_preset(&args.preset)?;
    let registry = EffectRegistry::new();
    let ctx = AudioContext::new(config.sample_rate as f32);
    let mut chain = ChainManager::new(&ctx).with_buffer_size(config.buffer_size);

    chain.set_master(config.master);
    chain.load_preset(&preset, &registry)?;
    if let Some(master) = args.master {
        chain.set_master(master);
    }

    if args.tuner {
        let id = engage_tuner(&mut chain, &config);
        if let Some(tuner) = chain.get(id).and_then(|pedal| pedal.as_tuner()) {
            tuner.reading().subscribe(print_reading);
        }
    }

    let backend = Arc::new(CpalBackend::new());
    chain.switch_output(backend.as_ref(), config.output_device.as_deref())?;
    chain.request_input(backend.clone(), config.input_device.as_deref());
    if !chain.wait_input(INPUT_WAIT) {
        tracing::warn!(device = ?config.input_device, "no input yet, playing without it");
    }

    println!("Playing '{}' ({} effect(s))", preset.id, chain.len());
    println!("  Chain:  {}", chain.models().join(" -> "));
    println!("  Input:  {}", chain.input_device().unwrap_or("default"));
    println!("  Output: {}", chain.output_device().unwrap_or("default"));
    println!("  Master: {:.2}", chain.master());
    println!("  Host:   {}", backend.name());
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    while running.load(Ordering::SeqCst) {
        if !chain.has_input() {
            chain.poll_input();
        }
        std::thread::sleep(POLL_INTERVAL);
    }

    chain.close_streams();
    tracing::info!(preset = %preset.id, "playback stopped");
    println!("Done.");
    Ok(())
}

/// Activate the chain's tuner, adding one at the head if the preset has none.
fn engage_tuner(chain: &mut ChainManager, config: &RigConfig) -> EffectId {
    let existing = chain
        .effects()
        .iter()
        .find(|pedal| pedal.as_tuner().is_some())
        .map(|pedal| pedal.id());

    let id = existing.unwrap_or_else(|| {
        let tuner = Tuner::with_interval(chain.ctx(), config.tuner_interval());
        let id = chain.add_effect(tuner.into(), false);
        if let Some(position) = chain.position(id) {
            chain.move_effect(position, 0);
        }
        id
    });

    if let Some(pedal) = chain.get_mut(id) {
        pedal.set_active(true);
    }
    id
}

fn print_reading(reading: &TunerReading) {
    if let (Some(note), Some(cents)) = (&reading.note, reading.cents) {
        println!("  {:4} {:+4} cents", note, cents);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stomp_config::factory_preset;

    fn chain_for(ctx: &AudioContext, preset: &str) -> ChainManager {
        let mut chain = ChainManager::new(ctx);
        chain
            .load_preset(&factory_preset(preset).unwrap(), &EffectRegistry::new())
            .unwrap();
        chain
    }

    #[test]
    fn engages_the_preset_tuner() {
        let ctx = AudioContext::new(48000.0);
        let mut chain = chain_for(&ctx, "clean");
        let len = chain.len();

        let id = engage_tuner(&mut chain, &RigConfig::default());

        assert_eq!(chain.len(), len);
        assert_eq!(chain.position(id), Some(0));
        assert!(chain.get(id).is_some_and(|pedal| pedal.is_active()));
    }

    #[test]
    fn adds_a_tuner_at_the_head() {
        let ctx = AudioContext::new(48000.0);
        let mut chain = chain_for(&ctx, "crunch");

        let id = engage_tuner(&mut chain, &RigConfig::default());

        assert_eq!(chain.models(), ["tuner", "compressor", "crunch", "cabinet"]);
        assert_eq!(chain.position(id), Some(0));
        assert!(chain.get(id).is_some_and(|pedal| pedal.is_active()));
    }
}
