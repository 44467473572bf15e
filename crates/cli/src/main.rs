/// Entry point for the smalipatch CLI.
///
/// Parses arguments, sets up logging and dispatches to the `apply` or `list`
/// subcommand.
use clap::Parser;
use smalipatch_cli::commands::{Cmd, Command};
use tracing_subscriber::EnvFilter;

/// Applies patch manifests to apps decoded with apktool.
#[derive(Parser)]
#[command(name = "smalipatch")]
#[command(about = "smalipatch: patch decompiled Android apps")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();

    cli.command.execute()
}
