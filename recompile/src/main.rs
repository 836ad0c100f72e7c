//! Recompile - incremental recompilation from a persisted dependency graph
//!
//! Commands:
//! 1. `record` / `forget` edit the graph
//! 2. `detect` turns item snapshots into change events
//! 3. `outdated` propagates change events over the graph
//! 4. `explain`, `stats`, `cycles` and the registered `dot` inspect it

mod cli;
mod commands;
mod config;
mod env;
mod error;
mod registry;

use clap::Parser;
use cli::{Cli, Commands};
use commands::CommandContext;
use config::RecompileConfig;
use env::EnvironmentCapabilities;
use registry::CommandRegistry;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> error::Result<()> {
    let mut config = RecompileConfig::load(&cli.config)?;
    if let Some(graph) = cli.graph {
        config.graph_file = graph;
    }
    if let Some(color) = cli.color {
        config.color = color;
    }

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let caps = EnvironmentCapabilities::detect(config.color);
    caps.apply();
    tracing::debug!(graph = %config.graph_file.display(), ?caps, "Starting");

    let mut registry = CommandRegistry::new();
    commands::dot::register(&mut registry)?;

    let ctx = CommandContext { config, caps };
    match cli.command {
        Commands::Record {
            dependent,
            source,
            props,
        } => commands::edit::record(&ctx, &dependent, &source, &props),
        Commands::Forget { item } => commands::edit::forget(&ctx, &item),
        Commands::Outdated { changes, json } => commands::outdated::execute(&ctx, &changes, json),
        Commands::Detect { snapshots, write } => {
            commands::detect::execute(&ctx, &snapshots, write)
        }
        Commands::Explain { item } => commands::explain::execute(&ctx, &item),
        Commands::Stats => commands::stats::stats(&ctx),
        Commands::Cycles => commands::stats::cycles(&ctx),
        Commands::External(args) => registry.dispatch(&ctx, &args),
    }
}
