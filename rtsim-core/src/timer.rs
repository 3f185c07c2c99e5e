//! One-shot wall-clock alarm.
//!
//! A [`OneShotTimer`] belongs to exactly one execution context. Arming it
//! replaces any pending expiry; there is never more than one outstanding.
//!
//! The owner observes expiry in one of two ways:
//!
//! - [`OneShotTimer::expired`] suspends until the deadline passes. Use it
//!   while the owner has nothing else to do.
//! - [`OneShotTimer::take_due`] polls without blocking. Use it between units
//!   of CPU-bound work so an expiry can preempt that work.
//!
//! Both consume the expiry: once observed, the timer is disarmed.

use std::time::Duration;
use tokio::time::Instant;

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A single pending wall-clock expiry, or none.
#[derive(Debug, Default, Clone)]
pub struct OneShotTimer {
    deadline: Option<Instant>,
}

impl OneShotTimer {
    /// Create a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an expiry `after` from now, replacing any pending one.
    ///
    /// A delay too large to represent is clamped to roughly thirty years.
    pub fn arm(&mut self, after: Duration) {
        let now = Instant::now();
        let deadline = now
            .checked_add(after)
            .unwrap_or_else(|| now + FAR_FUTURE);
        self.arm_at(deadline);
    }

    /// Schedule an expiry at an absolute instant, replacing any pending one.
    pub fn arm_at(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Cancel the pending expiry. No-op when disarmed.
    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Whether an expiry is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the pending expiry has passed without being consumed.
    pub fn is_due(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Consume the expiry if it has passed. Returns `true` when it fired.
    pub fn take_due(&mut self) -> bool {
        if self.is_due() {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Wait for the pending expiry and consume it.
    ///
    /// Pends forever while disarmed, so it can sit in a `select!` next to
    /// other event sources. Cancel safe: dropping the future before it
    /// completes leaves the timer armed.
    pub async fn expired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                tokio::time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
