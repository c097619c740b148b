//! ipharvest - cloud provider IP range collector
//!
//! Fetches published address lists and writes them partitioned by family,
//! kind and scope.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ipharvest::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            sources,
            output,
            format,
        } => {
            let fmt = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            ipharvest::commands::run::run(&sources, output, fmt, &cli.config).await
        }
        Commands::Sources => ipharvest::commands::sources::run(&cli.config),
        Commands::Init { force } => ipharvest::commands::init::run(force, &cli.config),
        Commands::Version => {
            println!("ipharvest {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
