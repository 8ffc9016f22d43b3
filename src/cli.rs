use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// A 3D force-directed graph layout engine.
#[derive(Parser, Debug)]
#[command(name = "forcelattice")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulation headless, logging statistics
    Run {
        /// How long to run before shutting down
        #[arg(short, long, default_value = "10")]
        seconds: u64,

        /// Disable the background node and edge generators
        #[arg(long)]
        no_growth: bool,

        /// Build the bulk random graph at startup
        #[arg(long)]
        bulk_seed: bool,

        /// Width of the offscreen surface in pixels
        #[arg(long, default_value = "800")]
        width: u32,

        /// Height of the offscreen surface in pixels
        #[arg(long, default_value = "600")]
        height: u32,
    },
    /// Compare direct and Barnes-Hut repulsion
    Bench {
        /// Node counts to measure
        #[arg(short, long, num_args = 1..)]
        nodes: Vec<usize>,

        /// Opening threshold; defaults to the configured value
        #[arg(short, long)]
        theta: Option<f64>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as YAML
    Config,
}
