//! Deadline registration with an external real-time scheduler.
//!
//! Workers forward their declared deadline to whatever deadline-aware
//! scheduling class the platform offers. Registration is best effort: when it
//! fails the worker keeps running at its default priority, and nothing in the
//! simulation depends on the scheduler enforcing anything.

use std::time::Duration;

use rtsim_core::TaskId;
use thiserror::Error;

/// Errors returned by a [`DeadlineRegistrar`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// No deadline-aware scheduling class is available.
    #[error("deadline scheduling is not available on this platform")]
    Unsupported,

    /// The scheduler refused the registration.
    #[error("scheduler rejected deadline registration: {0}")]
    Rejected(String),
}

/// Narrow interface to an external deadline-aware scheduler.
pub trait DeadlineRegistrar: Send + Sync {
    /// Ask the scheduler to treat the calling execution context as task
    /// `task_id` with relative deadline `deadline`.
    fn register_deadline(&self, task_id: TaskId, deadline: Duration)
    -> Result<(), RegistrationError>;
}

/// Registrar for platforms without a deadline scheduling class.
///
/// Always reports [`RegistrationError::Unsupported`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BestEffortRegistrar;

impl DeadlineRegistrar for BestEffortRegistrar {
    fn register_deadline(
        &self,
        _task_id: TaskId,
        _deadline: Duration,
    ) -> Result<(), RegistrationError> {
        Err(RegistrationError::Unsupported)
    }
}
