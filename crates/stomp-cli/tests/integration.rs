//! Integration tests for stomp-cli.
//!
//! Tests run the `stomp` binary for the listing commands and for end-to-end
//! offline rendering and tuning of WAV files. Device commands are left out
//! because CI hosts have no audio hardware.

use std::f32::consts::TAU;
use std::process::Command;
use stomp_io::{WavSpec, read_wav, write_wav};
use tempfile::TempDir;

/// Helper to get the path to the `stomp` binary built by cargo.
fn stomp_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_stomp"))
}

fn sine(frequency: f32, len: usize, sample_rate: u32) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 * (TAU * frequency * i as f32 / sample_rate as f32).sin())
        .collect()
}

fn stdout_of(args: &[&str]) -> String {
    let output = stomp_bin()
        .args(args)
        .output()
        .expect("failed to run stomp");
    assert!(
        output.status.success(),
        "stomp {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

#[test]
fn effects_lists_every_model() {
    let stdout = stdout_of(&["effects"]);
    assert!(stdout.contains("Available Effects"));
    for model in [
        "compressor",
        "ds1",
        "muff",
        "chorus",
        "phaser",
        "tremolo",
        "delay",
        "reverb",
        "cabinet",
        "tuner",
    ] {
        assert!(stdout.contains(model), "effects listing should contain '{model}'");
    }
}

#[test]
fn effect_detail_shows_controls() {
    let stdout = stdout_of(&["effects", "delay"]);
    for control in ["active", "time", "feedback", "tone", "mix"] {
        assert!(stdout.contains(control), "delay detail should list '{control}'");
    }
}

#[test]
fn unknown_effect_fails() {
    let output = stomp_bin().args(["effects", "wah"]).output().unwrap();
    assert!(!output.status.success());
}

#[test]
fn presets_list_shows_factory_chains() {
    let stdout = stdout_of(&["presets"]);
    for name in ["clean", "crunch", "fuzz-lead", "ambient"] {
        assert!(stdout.contains(name));
    }
    assert!(stdout.contains("muff -> delay -> cabinet"));
}

#[test]
fn curve_json_has_one_more_point_than_intervals() {
    let stdout = stdout_of(&["curve", "classic", "--samples", "32", "--json"]);
    let table: Vec<f32> = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(table.len(), 33);
}

#[test]
fn curve_without_family_lists_families() {
    let stdout = stdout_of(&["curve"]);
    assert!(stdout.contains("chebyshev"));
    assert!(stdout.contains("sustained"));
}

// ---------------------------------------------------------------------------
// File workflows
// ---------------------------------------------------------------------------

#[test]
fn render_writes_input_plus_tail() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    let output = dir.path().join("out.wav");
    write_wav(&input, &sine(220.0, 4800, 48000), WavSpec::default()).unwrap();

    stdout_of(&[
        "render",
        input.to_str().unwrap(),
        output.to_str().unwrap(),
        "--preset",
        "crunch",
        "--tail",
        "0.1",
        "--bit-depth",
        "24",
    ]);

    let (samples, spec) = read_wav(&output).unwrap();
    assert_eq!(spec.bits_per_sample, 24);
    assert_eq!(spec.sample_rate, 48000);
    assert_eq!(samples.len(), 4800 + 4800);
}

#[test]
fn render_rejects_odd_block_size() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.wav");
    write_wav(&input, &[0.0; 256], WavSpec::default()).unwrap();

    let output = stomp_bin()
        .args([
            "render",
            input.to_str().unwrap(),
            dir.path().join("out.wav").to_str().unwrap(),
            "--block-size",
            "100",
        ])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn tune_names_the_note() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("a3.wav");
    write_wav(&input, &sine(220.0, 8192, 48000), WavSpec::default()).unwrap();

    let stdout = stdout_of(&["tune", input.to_str().unwrap()]);
    assert!(stdout.contains("A3"));
}
