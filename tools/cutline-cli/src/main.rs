//! Cutline CLI: drive the playback core from scripted event sequences.
//!
//! Usage:
//!   cutline simulate <SCRIPT>   Replay a script against a simulated backend
//!   cutline ruler <SCRIPT>      Print ruler ticks and segment geometry
//!   cutline validate <SCRIPT>   Check that a script parses

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod script;

#[derive(Parser)]
#[command(
    name = "cutline",
    about = "Non-linear timeline playback core",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script of editing and transport events
    Simulate {
        /// Path to the script (JSON)
        script: PathBuf,

        /// Progress tick interval while time advances (seconds)
        #[arg(long, default_value = "0.25")]
        tick: f64,

        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the ruler and segment layout for a script's final timeline
    Ruler {
        /// Path to the script (JSON)
        script: PathBuf,

        /// Viewport width in pixels (defaults to the configured width)
        #[arg(long)]
        width: Option<f64>,
    },

    /// Validate a script without running it
    Validate {
        /// Path to the script (JSON)
        script: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = cutline_common::config::AppConfig::load();

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    cutline_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Simulate { script, tick, json } => {
            commands::simulate::run(script, tick, json, &config)
        }
        Commands::Ruler { script, width } => commands::ruler::run(script, width, &config),
        Commands::Validate { script } => commands::validate::run(script),
    }
}
