// src/main.rs

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Images {
            config,
            charts,
            json,
        } => commands::cmd_images(&config, &charts, json),
        Commands::Rewrite {
            values,
            registry,
            output,
        } => commands::cmd_rewrite(&values, &registry, output.as_deref()),
        Commands::Relocate {
            config,
            charts,
            registry,
        } => commands::cmd_relocate(&config, &charts, registry.as_deref()),
        Commands::Resolve {
            config,
            all,
            latest,
        } => commands::cmd_resolve(&config, all, latest),
    }
}
