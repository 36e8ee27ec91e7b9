// src/cli.rs
//! CLI definitions for helmport
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "helmport")]
#[command(author = "helmport contributors")]
#[command(version)]
#[command(about = "Discover, relocate and version-resolve the images of Helm charts", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the images referenced by the configured charts
    Images {
        /// Path to the configuration file
        #[arg(short, long, default_value = "helmport.toml")]
        config: PathBuf,

        /// Directory holding the unpacked charts
        #[arg(long, default_value = "charts")]
        charts: PathBuf,

        /// Print the references as JSON
        #[arg(long)]
        json: bool,
    },

    /// Point the image references of a values file at another registry
    Rewrite {
        /// Values file to rewrite
        #[arg(long)]
        values: PathBuf,

        /// Target registry, e.g. oci://registry.example.com/charts
        #[arg(long)]
        registry: String,

        /// Write the result here instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Relocate the images of the configured charts in place
    Relocate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "helmport.toml")]
        config: PathBuf,

        /// Directory holding the unpacked charts
        #[arg(long, default_value = "charts")]
        charts: PathBuf,

        /// Target registry; defaults to `registry` of the `[import]` section
        #[arg(long)]
        registry: Option<String>,
    },

    /// Resolve the version expressions of the configured charts
    Resolve {
        /// Path to the configuration file
        #[arg(short, long, default_value = "helmport.toml")]
        config: PathBuf,

        /// List every matching version instead of the best one
        #[arg(long)]
        all: bool,

        /// Ignore the expressions and report the newest published versions
        #[arg(long, conflicts_with = "all")]
        latest: bool,
    },
}
