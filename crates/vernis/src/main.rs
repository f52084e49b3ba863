//! # vernis
//!
//! Vernis - Embedded-language preprocessing for component files.
//!
//! ## Name Origin
//!
//! **Vernis** is French for *varnish*, the last coat a painter lays over a
//! finished canvas. The preprocessor is that coat for component files: it
//! turns every embedded block into the language the host compiler expects,
//! and keeps the source maps that lead back to what the author wrote.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "vernis")]
#[command(about = "Embedded-language preprocessing for component files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose two source maps into one
    #[command(visible_alias = "trame")]
    Chain(commands::chain::ChainArgs),

    /// Show the language and options a block alias resolves to
    Resolve(commands::resolve::ResolveArgs),
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VERNIS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Chain(args) => commands::chain::run(args),
        Commands::Resolve(args) => commands::resolve::run(args),
    }
}
