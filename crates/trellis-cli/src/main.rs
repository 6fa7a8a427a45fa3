//! Trellis CLI - Command-line interface for Trellis
//!
//! This is the entry point for working with schema knowledge graphs
//! from the shell: building them from a schema definition, inspecting
//! and converting persisted graphs, and running connectivity and
//! join-path queries.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(author = "Trellis Contributors")]
#[command(version)]
#[command(about = "Schema knowledge graphs and join-path resolution", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a schema graph from a schema definition file
    Build {
        /// JSON schema definition (tables + foreign keys)
        schema: PathBuf,

        /// Output graph file (.gml, .graphml or .bin)
        #[arg(short, long, default_value = "knowledge_graph.gml")]
        output: PathBuf,
    },

    /// Show statistics for a persisted graph
    Info {
        /// Graph file to inspect
        graph: PathBuf,
    },

    /// List tables connected to the given start tables
    Connected {
        /// Graph file to query
        graph: PathBuf,

        /// Start table names
        #[arg(required = true)]
        tables: Vec<String>,

        /// Maximum traversal depth (unbounded when omitted)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Resolve join paths connecting a set of seed tables
    Resolve {
        /// Graph file to query
        graph: PathBuf,

        /// Seed table names
        #[arg(required = true)]
        seeds: Vec<String>,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Convert a persisted graph between formats
    Convert {
        /// Input graph file
        input: PathBuf,

        /// Output graph file
        output: PathBuf,
    },

    /// Print a persisted graph as Graphviz DOT
    Dot {
        /// Graph file to render
        graph: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let result = match cli.command {
        Commands::Build { schema, output } => commands::build(&schema, &output),
        Commands::Info { graph } => commands::info(&graph),
        Commands::Connected {
            graph,
            tables,
            depth,
        } => commands::connected(&graph, &tables, depth),
        Commands::Resolve { graph, seeds, json } => commands::resolve(&graph, &seeds, json),
        Commands::Convert { input, output } => commands::convert(&input, &output),
        Commands::Dot { graph } => commands::dot(&graph),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
