//! Waypoint CLI - runs shortest-path queries over JSON graph files.
//!
//! The engine API is for embedding; the CLI is for trying queries against a
//! graph dump and inspecting what a file contains.

mod commands;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Waypoint shortest-path tool.
///
/// Loads a graph from a JSON file and streams shortest paths through the
/// batched execution pipeline.
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    format: OutputFormat,

    /// Suppress progress and info messages
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Execution settings as a JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Output format options.
#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table format (default for TTY)
    #[default]
    Table,
    /// Machine-readable JSON format
    Json,
}

/// Path elements to emit, one row each.
#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
enum Emit {
    /// Vertices, each with the edge leading to it
    #[default]
    Both,
    /// Vertices only
    Vertices,
    /// Edges only
    Edges,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Find the shortest path between two vertices
    Path(commands::path::PathArgs),

    /// Display graph information (collections and counts)
    Info {
        /// Path to the graph file
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    } else if !cli.quiet {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .init();
    }

    let result = match cli.command {
        Commands::Path(args) => {
            commands::path::run(&args, cli.config.as_deref(), cli.format, cli.quiet)
        }
        Commands::Info { path } => commands::info::run(&path, cli.format, cli.quiet),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
