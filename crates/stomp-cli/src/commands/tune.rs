//! Offline tuner command.

#![allow(clippy::print_literal)]

use crate::commands::common::to_bytes;
use clap::Args;
use std::path::PathBuf;
use stomp_analysis::{TunerReading, analyse};
use stomp_io::read_wav;

#[derive(Args)]
pub struct TuneArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Analysis window in samples
    #[arg(short, long, default_value = "2048")]
    window: usize,

    /// Step between windows in samples (defaults to the window size)
    #[arg(long)]
    hop: Option<usize>,

    /// Also print windows where no note was detected
    #[arg(long)]
    show_silent: bool,
}

pub fn run(args: TuneArgs) -> anyhow::Result<()> {
    if args.window == 0 {
        anyhow::bail!("--window must be at least 1");
    }
    let hop = args.hop.unwrap_or(args.window);
    if hop == 0 {
        anyhow::bail!("--hop must be at least 1");
    }

    let (samples, spec) = read_wav(&args.input)?;
    let sample_rate = spec.sample_rate as f32;
    println!(
        "{}: {} samples, {} Hz, {:.2}s",
        args.input.display(),
        samples.len(),
        spec.sample_rate,
        samples.len() as f32 / sample_rate
    );

    let readings = scan(&samples, sample_rate, args.window, hop);
    if readings.is_empty() {
        println!("File is shorter than one {}-sample window.", args.window);
        return Ok(());
    }

    println!("\n  {:>8}  {:6}  {}", "Time", "Note", "Cents");
    let mut silent = 0;
    for (time, reading) in &readings {
        match (&reading.note, reading.cents) {
            (Some(note), Some(cents)) => println!("  {:>7.3}s  {:6}  {:+}", time, note, cents),
            _ if args.show_silent => println!("  {:>7.3}s  {:6}  -", time, "-"),
            _ => silent += 1,
        }
    }
    if silent > 0 {
        println!("\n{} silent window(s) hidden; use --show-silent to list them.", silent);
    }
    Ok(())
}

/// One reading per full window, tagged with the window's start time.
fn scan(samples: &[f32], sample_rate: f32, window: usize, hop: usize) -> Vec<(f32, TunerReading)> {
    if samples.len() < window {
        return Vec::new();
    }
    (0..=samples.len() - window)
        .step_by(hop)
        .map(|start| {
            let bytes = to_bytes(&samples[start..start + window]);
            (start as f32 / sample_rate, analyse(&bytes, sample_rate))
        })
        .collect()
}
