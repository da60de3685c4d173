mod commands;

use clap::Parser;
use commands::{execute_command, Commands, OutputFormat};

/// Move playlists between music streaming catalogs
#[derive(Parser)]
#[command(
    name = "beatbridge",
    about = "Move playlists between music streaming catalogs",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // RUST_LOG still wins over the verbose default
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    if let Err(e) = execute_command(args.command, format).await {
        eprintln!("❌ Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
