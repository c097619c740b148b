//! Periodic progress lines while jobs run.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::info;

use crate::orchestrator::{OrchestrationState, ProgressSnapshot};

type Reporter = Arc<dyn Fn(&str) + Send + Sync>;

/// Reads [`OrchestrationState`] on a fixed interval and reports one line each
/// time. Lines go to `tracing` at INFO unless a reporter is set.
pub struct ProgressMonitor {
    state: Arc<OrchestrationState>,
    interval: Duration,
    started: Instant,
    reporter: Reporter,
}

impl ProgressMonitor {
    pub fn new(state: Arc<OrchestrationState>, interval: Duration) -> Self {
        Self {
            state,
            // interval_at panics on zero
            interval: interval.max(Duration::from_millis(1)),
            started: Instant::now(),
            reporter: Arc::new(|line: &str| info!("{}", line)),
        }
    }

    pub fn with_reporter<F>(mut self, reporter: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Start ticking. The first line comes one interval after the start.
    pub fn spawn(self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let ProgressMonitor {
            state,
            interval,
            started,
            reporter,
        } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    biased;
                    // Fires on stop() and when the handle is dropped
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let line = format_status(&state.snapshot(), started.elapsed());
                        reporter(&line);
                    }
                }
            }
        });

        MonitorHandle { stop: stop_tx, task }
    }
}

/// Running monitor.
pub struct MonitorHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the monitor and wait up to `timeout` for it to exit.
    ///
    /// Returns false if it had to be aborted.
    pub async fn stop(mut self, timeout: Duration) -> bool {
        // The receiver is only gone if the task already ended
        let _ = self.stop.send(());
        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(_) => true,
            Err(_) => {
                self.task.abort();
                false
            }
        }
    }
}

/// `[  12.0s] Progress: 3/14 completed | In progress: aws, gcp`
pub fn format_status(snapshot: &ProgressSnapshot, elapsed: Duration) -> String {
    let mut line = format!(
        "[{:>6.1}s] Progress: {}/{} completed",
        elapsed.as_secs_f64(),
        snapshot.completed,
        snapshot.total
    );
    if !snapshot.running.is_empty() {
        line.push_str(" | In progress: ");
        line.push_str(&snapshot.running.join(", "));
    }
    line
}
