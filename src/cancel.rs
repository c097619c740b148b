//! Per-job cooperative cancellation.
//!
//! Each scheduled job receives its own [`JobToken`]. The fetcher checks it
//! before every attempt and after every retry delay. An [`HttpSource`] checks
//! it before each URL, and [`SourceJob::acquire_and_process`] checks it once
//! more before the engine pass starts writing. Once the engine pass runs it
//! is not interrupted. The orchestrator itself never cancels; jobs run to
//! completion or failure.
//!
//! [`HttpSource`]: crate::sources::HttpSource
//! [`SourceJob::acquire_and_process`]: crate::sources::SourceJob::acquire_and_process

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::HarvestError;

/// A flag shared between a job and whoever may want to stop it.
#[derive(Clone, Debug, Default)]
pub struct JobToken {
    flag: Arc<AtomicBool>,
}

impl JobToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Request cancellation on this token and all its clones.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), HarvestError> {
        if self.is_cancelled() {
            Err(HarvestError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_token() {
        let token = JobToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
        token.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(HarvestError::Cancelled)));
    }

    #[test]
    fn test_job_token_clone() {
        let token1 = JobToken::new();
        let token2 = token1.clone();

        token1.cancel();

        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
    }

    #[test]
    fn test_tokens_are_independent() {
        let a = JobToken::new();
        let b = JobToken::new();
        a.cancel();
        assert!(!b.is_cancelled());
    }

    #[test]
    fn test_multiple_cancels() {
        let token = JobToken::default();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
