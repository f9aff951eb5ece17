//! Factory preset listing and export command.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use stomp_config::{factory_preset, factory_presets};

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: Option<PresetsCommand>,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List factory presets and their chains
    List,

    /// Write a factory preset to a JSON file
    Export {
        /// Factory preset name
        name: String,

        /// Destination file
        output: PathBuf,
    },
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(PresetsCommand::List) {
        PresetsCommand::List => {
            println!("Factory Presets");
            println!("===============\n");
            for preset in factory_presets() {
                let chain: Vec<&str> = preset.chain().map(|fx| fx.model.as_str()).collect();
                let master = preset
                    .master()
                    .map(|m| format!("{:.2}", m))
                    .unwrap_or_else(|| "-".into());
                println!("  {:10}  master {}  {}", preset.id, master, chain.join(" -> "));
            }
        }
        PresetsCommand::Export { name, output } => {
            let preset = factory_preset(&name)
                .ok_or_else(|| anyhow::anyhow!("Unknown factory preset: {}", name))?;
            preset.save(&output)?;
            println!("Wrote {} to {}", preset.id, output.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stomp_config::Preset;
    use tempfile::TempDir;

    #[test]
    fn export_writes_loadable_json() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("ambient.json");
        run(PresetsArgs {
            command: Some(PresetsCommand::Export {
                name: "ambient".into(),
                output: output.clone(),
            }),
        })
        .unwrap();

        assert_eq!(Preset::load(&output).unwrap(), factory_preset("ambient").unwrap());
    }

    #[test]
    fn exporting_unknown_preset_fails() {
        let dir = TempDir::new().unwrap();
        let result = run(PresetsArgs {
            command: Some(PresetsCommand::Export {
                name: "polka".into(),
                output: dir.path().join("polka.json"),
            }),
        });
        assert!(result.is_err());
        assert!(!dir.path().join("polka.json").exists());
    }
}
