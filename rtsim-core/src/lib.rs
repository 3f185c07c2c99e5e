//! # rtsim-core
//!
//! Core abstractions for the rtsim workload simulator.
//!
//! This crate provides the leaf pieces that both the orchestrator and its
//! workers build on:
//!
//! - **Provider traits**: Abstractions for time and randomness
//! - **Timing primitives**: A one-shot alarm and a one-way notification channel
//! - **Task types**: [`TaskSpec`] and its timing [`Bounds`]
//!
//! ## Provider Traits
//!
//! - [`TimeProvider`]: Sleep and elapsed-time queries
//! - [`RandomProvider`]: Seeded random number generation
//!
//! ## Primitives
//!
//! - [`OneShotTimer`]: Arm/disarm a single wall-clock expiry
//! - [`notification_channel`]: `Start`/`Stop` delivery to a single worker
//!
//! ## Sampling
//!
//! [`uniform`] draws a timing parameter from its [`Bounds`], returning the
//! lower bound exactly when the interval is degenerate.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod error;
mod random;
mod signal;
mod task;
mod time;
mod timer;

// Error exports
pub use error::{NotifyError, SampleError, TaskSpecError};

// Provider trait exports
pub use random::{RandomProvider, SeededRandomProvider, uniform};
pub use time::{TimeError, TimeProvider, TokioTimeProvider};

// Primitive exports
pub use signal::{Notification, NotificationReceiver, NotificationSender, notification_channel};
pub use timer::OneShotTimer;

// Task type exports
pub use task::{Bounds, TaskId, TaskSpec};
