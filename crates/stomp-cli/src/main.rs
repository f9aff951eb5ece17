//! Stomp CLI - command-line front end for the stomp guitar rig.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stomp")]
#[command(author, version, about = "Stomp guitar rig CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List audio input and output devices
    Devices(commands::devices::DevicesArgs),

    /// List available effects and their parameters
    Effects(commands::effects::EffectsArgs),

    /// List or export factory presets
    Presets(commands::presets::PresetsArgs),

    /// Print a synthesized distortion curve
    Curve(commands::curve::CurveArgs),

    /// Detect the pitch of a WAV file window by window
    Tune(commands::tune::TuneArgs),

    /// Run a WAV file through a preset offline
    Render(commands::render::RenderArgs),

    /// Run live audio through a preset until Ctrl+C
    Play(commands::play::PlayArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Effects(args) => commands::effects::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Curve(args) => commands::curve::run(args),
        Commands::Tune(args) => commands::tune::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_arguments_parse() {
        let cli = Cli::try_parse_from([
            "stomp", "render", "in.wav", "out.wav", "--preset", "crunch", "--tail", "1.5",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Render(_)));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["stomp", "explode"]).is_err());
    }
}
