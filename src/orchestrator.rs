//! Job scheduling.
//!
//! Every selected source becomes one job. Jobs run on a bounded pool and never
//! see each other: a failing or panicking job is recorded as a failed
//! [`JobOutcome`] while its siblings carry on. The only shared state is
//! [`OrchestrationState`], which the [`ProgressMonitor`] reads.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::cancel::JobToken;
use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::progress::ProgressMonitor;
use crate::sources::{JobContext, SourceJob};

/// Lifecycle of one job: `Pending -> Running -> Succeeded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Final result of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub state: JobState,
    pub error: Option<String>,
    pub elapsed: Duration,
    pub files_written: usize,
}

impl JobOutcome {
    pub fn succeeded(elapsed: Duration, files_written: usize) -> Self {
        Self {
            state: JobState::Succeeded,
            error: None,
            elapsed,
            files_written,
        }
    }

    pub fn failed(elapsed: Duration, error: impl Into<String>) -> Self {
        Self {
            state: JobState::Failed,
            error: Some(error.into()),
            elapsed,
            files_written: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == JobState::Succeeded
    }
}

#[derive(Debug, Default)]
struct Progress {
    running: BTreeSet<String>,
    completed: BTreeSet<String>,
}

/// Point-in-time copy of the run's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    /// Sorted
    pub running: Vec<String>,
}

/// Which jobs are running and which are done, behind one mutex.
///
/// Lives for one run. Shared by the orchestrator (writer) and the progress
/// monitor (reader).
#[derive(Debug)]
pub struct OrchestrationState {
    total: usize,
    inner: Mutex<Progress>,
}

impl OrchestrationState {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            inner: Mutex::new(Progress::default()),
        }
    }

    // The sets are always consistent, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mark_running(&self, id: &str) {
        self.lock().running.insert(id.to_string());
    }

    pub fn mark_completed(&self, id: &str) {
        let mut progress = self.lock();
        progress.running.remove(id);
        progress.completed.insert(id.to_string());
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let progress = self.lock();
        ProgressSnapshot {
            total: self.total,
            completed: progress.completed.len(),
            running: progress.running.iter().cloned().collect(),
        }
    }
}

/// A job ready to be dispatched.
pub struct ScheduledJob {
    pub id: String,
    pub source: Arc<dyn SourceJob>,
    pub output_root: PathBuf,
}

impl ScheduledJob {
    pub fn new(id: impl Into<String>, source: Arc<dyn SourceJob>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            source,
            output_root: output_root.into(),
        }
    }
}

/// Every job's outcome plus the run's wall-clock time.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub outcomes: BTreeMap<String, JobOutcome>,
    pub total_elapsed: Duration,
}

impl RunOutcome {
    pub fn has_failures(&self) -> bool {
        self.outcomes.values().any(|o| !o.is_success())
    }
}

pub struct Orchestrator {
    workers: usize,
    progress_interval: Duration,
    monitor_stop_timeout: Duration,
    fetcher: Arc<Fetcher>,
}

impl Orchestrator {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self {
            workers: default_workers(),
            progress_interval: Duration::from_secs(3),
            monitor_stop_timeout: Duration::from_secs(1),
            fetcher,
        }
    }

    pub fn from_config(config: &Config, fetcher: Arc<Fetcher>) -> Self {
        let workers = match config.workers {
            0 => default_workers(),
            n => n,
        };
        Self {
            workers,
            progress_interval: Duration::from_secs(config.progress_interval_secs.max(1)),
            monitor_stop_timeout: Duration::from_millis(config.monitor_stop_timeout_ms),
            fetcher,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.progress_interval = interval;
        }
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every job to completion.
    ///
    /// Never fails: job errors and panics end up in the returned outcomes.
    /// The progress monitor is stopped (bounded wait) before this returns.
    pub async fn run(&self, jobs: Vec<ScheduledJob>) -> RunOutcome {
        let started = Instant::now();
        let state = Arc::new(OrchestrationState::new(jobs.len()));
        info!(
            "Running {} source(s) with {} worker(s)",
            jobs.len(),
            self.workers
        );

        let monitor = ProgressMonitor::new(Arc::clone(&state), self.progress_interval).spawn();

        let outcomes: BTreeMap<String, JobOutcome> = stream::iter(jobs)
            .map(|job| self.dispatch(job, Arc::clone(&state)))
            .buffer_unordered(self.workers)
            .collect()
            .await;

        if !monitor.stop(self.monitor_stop_timeout).await {
            warn!("Progress monitor did not stop in time");
        }

        RunOutcome {
            outcomes,
            total_elapsed: started.elapsed(),
        }
    }

    async fn dispatch(&self, job: ScheduledJob, state: Arc<OrchestrationState>) -> (String, JobOutcome) {
        let ScheduledJob { id, source, output_root } = job;
        let ctx = JobContext {
            fetcher: Arc::clone(&self.fetcher),
            output_root,
            token: JobToken::new(),
        };

        state.mark_running(&id);
        info!("Starting {}", id);
        let started = Instant::now();

        let task = tokio::spawn(async move { source.acquire_and_process(&ctx).await });
        let outcome = match task.await {
            Ok(Ok(report)) => {
                let elapsed = started.elapsed();
                debug!(
                    "{}: {} literals, {} dimension(s)",
                    id,
                    report.stats.total,
                    report.buckets.len()
                );
                info!("Finished {} in {:.2}s", id, elapsed.as_secs_f64());
                JobOutcome::succeeded(elapsed, report.files_written)
            }
            Ok(Err(e)) => {
                let message = format!("{:#}", e);
                error!("{} failed: {}", id, message);
                JobOutcome::failed(started.elapsed(), message)
            }
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    format!("Job panicked: {}", panic_message(join_error.into_panic()))
                } else {
                    "Job was cancelled".to_string()
                };
                error!("{} failed: {}", id, message);
                JobOutcome::failed(started.elapsed(), message)
            }
        };

        state.mark_completed(&id);
        (id, outcome)
    }
}

/// Available hardware concurrency, at least 1.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
