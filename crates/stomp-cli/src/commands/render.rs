//! Offline preset rendering command.

use crate::commands::common::{load_preset, peak, rms};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use stomp_config::{Preset, RENDER_QUANTUM};
use stomp_core::{AudioContext, linear_to_db};
use stomp_io::{WavSpec, read_wav, write_wav};
use stomp_registry::EffectRegistry;
use stomp_rig::ChainManager;

#[derive(Args)]
pub struct RenderArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Factory preset name or preset JSON file
    #[arg(short, long, default_value = "clean")]
    preset: String,

    /// Override the preset's master level (0..1)
    #[arg(long)]
    master: Option<f32>,

    /// Processing block size; a multiple of 128
    #[arg(long, default_value = "512")]
    block_size: usize,

    /// Seconds of silence rendered after the input so tails ring out
    #[arg(long, default_value = "0")]
    tail: f32,

    /// Output bit depth (16, 24, or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    if args.block_size == 0 || args.block_size % RENDER_QUANTUM as usize != 0 {
        anyhow::bail!("--block-size must be a positive multiple of {}", RENDER_QUANTUM);
    }
    if !args.tail.is_finite() || args.tail < 0.0 {
        anyhow::bail!("--tail must be zero or more seconds");
    }
    if !matches!(args.bit_depth, 16 | 24 | 32) {
        anyhow::bail!("--bit-depth must be 16, 24 or 32");
    }

    println!("Reading {}...", args.input.display());
    let (samples, spec) = read_wav(&args.input)?;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "  {} samples, {} Hz, {:.2}s",
        samples.len(),
        spec.sample_rate,
        samples.len() as f32 / sample_rate
    );

    let preset = load_preset(&args.preset)?;
    let models: Vec<&str> = preset.chain().map(|fx| fx.model.as_str()).collect();
    println!("Preset {}: {}", preset.id, models.join(" -> "));

    let tail = (args.tail * sample_rate).round() as usize;
    let total = samples.len() + tail;

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    let output = render_samples(
        &preset,
        &samples,
        sample_rate,
        args.master,
        args.block_size,
        tail,
        |done| pb.set_position(done as u64),
    )?;
    pb.finish_with_message("done");

    println!("\nStats:");
    println!(
        "  Input:  RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&samples)),
        linear_to_db(peak(&samples))
    );
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB",
        linear_to_db(rms(&output)),
        linear_to_db(peak(&output))
    );

    let out_spec = WavSpec {
        channels: 1,
        sample_rate: spec.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    println!("\nWriting {}...", args.output.display());
    write_wav(&args.output, &output, out_spec)?;
    println!("Done!");

    Ok(())
}

/// Run `samples` plus `tail` samples of silence through a fresh chain built
/// from `preset`. `progress` receives the number of samples rendered so far.
fn render_samples(
    preset: &Preset,
    samples: &[f32],
    sample_rate: f32,
    master: Option<f32>,
    block_size: usize,
    tail: usize,
    mut progress: impl FnMut(usize),
) -> anyhow::Result<Vec<f32>> {
    let ctx = AudioContext::new(sample_rate);
    let registry = EffectRegistry::new();
    let mut chain = ChainManager::new(&ctx);
    chain.load_preset(preset, &registry)?;
    if let Some(master) = master {
        chain.set_master(master);
    }

    let total = samples.len() + tail;
    let blocks = total.div_ceil(block_size);
    let mut input = Vec::with_capacity(blocks * block_size);
    input.extend_from_slice(samples);
    input.resize(blocks * block_size, 0.0);
    let mut output = vec![0.0; input.len()];

    for (i, (in_block, out_block)) in input
        .chunks(block_size)
        .zip(output.chunks_mut(block_size))
        .enumerate()
    {
        ctx.render(in_block, out_block);
        progress(((i + 1) * block_size).min(total));
    }

    output.truncate(total);
    tracing::debug!(blocks, block_size, tail, "offline render finished");
    Ok(output)
}
