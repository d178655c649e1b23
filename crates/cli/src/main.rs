//! Ability simulator.
//!
//! Casts recipes against an in-memory host and prints every dispatch the
//! interpreter makes, frame by frame.
//! Run with: `ability-sim run cleave --dummy 1.5,0`

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{ListRecipes, RunCast};
use runtime::RuntimeConfig;

/// Ability recipe simulator
#[derive(Parser)]
#[command(name = "ability-sim")]
#[command(about = "Simulate ability casts frame by frame", long_about = None)]
#[command(version)]
struct Cli {
    /// Extra recipe directory (overrides ABILITY_CONTENT_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    content_dir: Option<PathBuf>,

    /// Engine configuration TOML (overrides ABILITY_ENGINE_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    engine_config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Cast one recipe and print its dispatch trace
    Run(RunCast),

    /// List the recipes in the library
    List(ListRecipes),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::setup_logging(cli.verbose);

    let mut config = RuntimeConfig::from_env();
    if cli.content_dir.is_some() {
        config.content_dir = cli.content_dir;
    }
    if cli.engine_config.is_some() {
        config.engine_config = cli.engine_config;
    }

    match cli.command {
        Command::Run(cmd) => cmd.execute(&config).await,
        Command::List(cmd) => cmd.execute(&config),
    }
}
