//! Progress reporting for long-running operations.
//!
//! The bulk scraper reports one step per subreddit. The CLI renders steps
//! as an indicatif bar; tests and quiet modes use `NoopProgressReporter`.

use std::sync::Arc;

use async_trait::async_trait;

/// Reports progress for long-running operations.
///
/// `current` goes from 0.0 to `total`. Implementations never fail the caller.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, current: f64, total: f64, message: Option<String>);

    /// Report a step out of N total steps.
    async fn step(&self, step: usize, total_steps: usize, message: &str) {
        let current = if total_steps == 0 {
            1.0
        } else {
            step as f64 / total_steps as f64
        };
        self.report(current, 1.0, Some(message.to_string())).await;
    }
}

pub struct NoopProgressReporter;

#[async_trait]
impl ProgressReporter for NoopProgressReporter {
    async fn report(&self, _current: f64, _total: f64, _message: Option<String>) {}
}

pub fn noop_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(NoopProgressReporter)
}
