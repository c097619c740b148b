//! End-of-run summary.
//!
//! Folds every [`JobOutcome`] into an [`ExecutionSummary`] that can be printed
//! as text or JSON and that decides the process exit status.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

use crate::orchestrator::{JobOutcome, JobState};

const RULE_WIDTH: usize = 70;

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for SummaryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(SummaryFormat::Text),
            "json" => Ok(SummaryFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureDetail {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceDetail {
    pub id: String,
    pub status: JobState,
    pub elapsed_secs: f64,
    pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub total_duration_secs: f64,
    pub sources: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// In identifier order
    pub failures: Vec<FailureDetail>,
    /// Fastest first
    pub details: Vec<SourceDetail>,
}

impl ExecutionSummary {
    pub fn aggregate(outcomes: &BTreeMap<String, JobOutcome>, total: Duration) -> Self {
        let failures: Vec<FailureDetail> = outcomes
            .iter()
            .filter(|(_, o)| !o.is_success())
            .map(|(id, o)| FailureDetail {
                id: id.clone(),
                error: o.error.clone().unwrap_or_else(|| "unknown error".to_string()),
            })
            .collect();

        let mut details: Vec<SourceDetail> = outcomes
            .iter()
            .map(|(id, o)| SourceDetail {
                id: id.clone(),
                status: o.state,
                elapsed_secs: o.elapsed.as_secs_f64(),
                files: o.files_written,
            })
            .collect();
        // Stable sort keeps identifier order for equal durations
        details.sort_by(|a, b| a.elapsed_secs.total_cmp(&b.elapsed_secs));

        Self {
            total_duration_secs: total.as_secs_f64(),
            sources: outcomes.len(),
            succeeded: outcomes.len() - failures.len(),
            failed: failures.len(),
            failures,
            details,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// 1 if any source failed.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            1
        } else {
            0
        }
    }

    pub fn render(&self, format: SummaryFormat) -> anyhow::Result<String> {
        match format {
            SummaryFormat::Text => Ok(self.render_text()),
            SummaryFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    pub fn render_text(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "EXECUTION SUMMARY");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(
            out,
            "Total duration: {:.2}s | Sources: {} | Success: {} | Failed: {}",
            self.total_duration_secs, self.sources, self.succeeded, self.failed
        );

        if !self.failures.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "FAILED SOURCES:");
            for failure in &self.failures {
                let _ = writeln!(out, "  {}: {}", failure.id, failure.error);
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "SOURCE DETAILS (sorted by duration):");
        for detail in &self.details {
            let status = if detail.status == JobState::Succeeded {
                "OK"
            } else {
                "FAILED"
            };
            let _ = writeln!(
                out,
                "  {:<20} [{:<6}] {:>6.2}s | {:>3} files",
                detail.id, status, detail.elapsed_secs, detail.files
            );
        }
        let _ = writeln!(out, "{}", rule);
        out
    }
}
