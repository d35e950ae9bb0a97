mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "astrostack", about = "Astronomical frame alignment and stacking")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show image file metadata
    Info(commands::info::InfoArgs),
    /// Detect stars in an image
    Detect(commands::detect::DetectArgs),
    /// Align and stack a set of frames
    Stack(commands::stack::StackArgs),
    /// Print a default stacking config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Stack(args) => commands::stack::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
