//! Audio device listing command.

use clap::Args;
use stomp_io::{CpalBackend, DeviceBackend, DeviceInfo, DeviceKind};

#[derive(Args)]
pub struct DevicesArgs {
    /// Print the device list as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let backend = CpalBackend::new();
    let devices = backend.list_devices()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&devices))?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Available Audio Devices ({})", backend.name());
    println!("=======================\n");

    for kind in [DeviceKind::Input, DeviceKind::Output] {
        let matching: Vec<_> = devices.iter().filter(|d| d.kind == kind).collect();
        if matching.is_empty() {
            continue;
        }
        println!("{} Devices:", capitalize(kind.name()));
        for device in &matching {
            println!("  [{}] {}", device.id, device.label);
        }
        println!();
    }

    let inputs = devices.iter().filter(|d| d.kind == DeviceKind::Input).count();
    println!(
        "Total: {} input(s), {} output(s)",
        inputs,
        devices.len() - inputs
    );
    println!();
    println!("Tip: pass a label or part of one with --input/--output:");
    println!("  stomp play --preset clean --input \"USB\" --output \"Headphones\"");

    Ok(())
}

/// `{ "inputs": [{id, label}], "outputs": [{id, label}] }`.
fn to_json(devices: &[DeviceInfo]) -> serde_json::Value {
    let of_kind = |kind: DeviceKind| {
        devices
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| serde_json::json!({ "id": d.id, "label": d.label }))
            .collect::<Vec<_>>()
    };
    serde_json::json!({
        "inputs": of_kind(DeviceKind::Input),
        "outputs": of_kind(DeviceKind::Output),
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}
