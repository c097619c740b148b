//! Run command implementation.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::orchestrator::{Orchestrator, ScheduledJob};
use crate::scope::sanitize_key;
use crate::sources::Registry;
use crate::summary::{ExecutionSummary, SummaryFormat};

/// Run the selected sources and print the summary.
///
/// Fails (exit status 1) when the configuration cannot be loaded, a requested
/// source is unknown, or any job failed.
pub async fn run(
    requested: &[String],
    output: Option<PathBuf>,
    format: SummaryFormat,
    config_path: &Path,
) -> Result<()> {
    let mut config = Config::load(config_path)?;
    if let Some(output) = output {
        config.output_dir = output;
    }

    let registry = Registry::builtin();
    let jobs = schedule(&config, &registry, requested)?;
    if jobs.is_empty() {
        warn!("No sources selected");
    }

    let fetcher = Arc::new(Fetcher::from_config(&config.http)?);
    let orchestrator = Orchestrator::from_config(&config, fetcher);
    let run = orchestrator.run(jobs).await;

    let summary = ExecutionSummary::aggregate(&run.outcomes, run.total_elapsed);
    print!("{}", summary.render(format)?);
    if format == SummaryFormat::Json {
        println!();
    }

    if summary.has_failures() {
        anyhow::bail!("{} of {} source(s) failed", summary.failed, summary.sources);
    }
    info!("Output written to {:?}", config.output_dir);
    Ok(())
}

/// Resolve requested identifiers into jobs, each writing under
/// `<output_dir>/<sanitized identifier>`.
pub fn schedule(config: &Config, registry: &Registry, requested: &[String]) -> Result<Vec<ScheduledJob>> {
    config
        .select_sources(requested)?
        .into_iter()
        .map(|(id, source)| -> Result<ScheduledJob> {
            let job = registry.resolve(id, source)?;
            Ok(ScheduledJob::new(id, job, config.output_dir.join(output_dir_name(id))))
        })
        .collect()
}

fn output_dir_name(id: &str) -> String {
    match sanitize_key(id) {
        name if name.is_empty() => "source".to_string(),
        name => name,
    }
}
