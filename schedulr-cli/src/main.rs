mod commands;
mod render;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use schedulr_core::SchedulrConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schedulr")]
#[command(about = "Visualize your class schedule and find the best times to study")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the week of an .ics file with AI study suggestions
    View {
        /// Path to the .ics file, or "-" for stdin
        file: String,

        /// Print a detail card for every event
        #[arg(short, long)]
        details: bool,

        /// Only show classes, without asking the AI for study blocks
        #[arg(long)]
        no_suggestions: bool,

        /// Time zone to show the week in (e.g. "Europe/Berlin")
        #[arg(long)]
        timezone: Option<String>,

        /// How far ahead to expand recurring classes (e.g. "6months")
        #[arg(long)]
        horizon: Option<String>,
    },
    /// Print the request that would be sent to the AI, without sending it
    Prompt {
        /// Path to the .ics file, or "-" for stdin
        file: String,

        #[arg(long)]
        timezone: Option<String>,

        #[arg(long)]
        horizon: Option<String>,
    },
    /// Show the config file location and effective settings
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::View {
            file,
            details,
            no_suggestions,
            timezone,
            horizon,
        } => {
            let config = load_config(timezone, horizon)?;
            commands::view::run(&config, &file, details, no_suggestions).await
        }
        Commands::Prompt {
            file,
            timezone,
            horizon,
        } => {
            let config = load_config(timezone, horizon)?;
            commands::prompt::run(&config, &file)
        }
        Commands::Config => {
            let config = load_config(None, None)?;
            commands::config::run(&config)
        }
    }
}

/// Load config and apply command-line overrides on top.
fn load_config(timezone: Option<String>, horizon: Option<String>) -> Result<SchedulrConfig> {
    let mut config = SchedulrConfig::load()?;

    if let Some(tz) = timezone {
        debug!("Overriding timezone with {}", tz);
        config.timezone = Some(tz);
    }
    if let Some(horizon) = horizon {
        debug!("Overriding recurrence horizon with {}", horizon);
        config.recurrence_horizon = horizon;
    }

    Ok(config)
}
