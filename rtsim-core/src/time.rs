//! Time provider abstraction.
//!
//! Orchestrator settle delays and job elapsed-time measurement go through
//! [`TimeProvider`] so tests can substitute their own clock.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Errors that can occur during time operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The operation timed out.
    #[error("operation timed out")]
    Elapsed,
}

/// Provider trait for time operations.
///
/// ## Time Semantics
///
/// - `now()`: Wall-clock time elapsed since the provider was created. Job
///   start offsets and elapsed execution times are measured with it.
/// - `sleep()`: Suspends the calling task without consuming CPU.
#[async_trait(?Send)]
pub trait TimeProvider: Clone {
    /// Sleep for the specified duration.
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError>;

    /// Get the time elapsed since provider creation.
    fn now(&self) -> Duration;
}

/// Real time provider using Tokio's time facilities.
///
/// Reads Tokio's clock, so it follows a paused test runtime.
#[derive(Debug, Clone)]
pub struct TokioTimeProvider {
    /// Start time for calculating elapsed duration
    start_time: Instant,
}

impl TokioTimeProvider {
    /// Create a new Tokio time provider.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

impl Default for TokioTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }
}
