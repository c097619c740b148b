//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ipharvest")]
#[command(author, version, about = "Collect and partition published cloud provider IP ranges")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml", global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch sources and write partitioned IP lists
    Run {
        /// Source identifiers to run (default: all enabled)
        sources: Vec<String>,

        /// Override the output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Summary format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List available and configured sources
    Sources,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version
    Version,
}
