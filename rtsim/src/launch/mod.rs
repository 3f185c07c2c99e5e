//! Worker launchers.
//!
//! The orchestrator never creates execution contexts itself. It asks a
//! [`WorkerLauncher`] for one [`WorkerHandle`] per task and only ever talks to
//! workers through those handles: notify, check for exit, wait.
//!
//! Two launchers exist:
//!
//! - [`ThreadLauncher`]: one OS thread per worker, each with its own
//!   single-threaded runtime.
//! - [`ProcessLauncher`]: one `rtsim-task` process per worker, notified over
//!   stdin.

use std::fmt;
use std::io;

use async_trait::async_trait;
use rtsim_core::{Notification, NotifyError, TaskId, TaskSpec, TaskSpecError};
use thiserror::Error;

mod process;
mod thread;

pub use process::{ProcessHandle, ProcessLauncher};
pub use thread::{ThreadHandle, ThreadLauncher};

/// Errors raised while launching a worker.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The execution context could not be created.
    #[error("failed to launch task {task_id}: {source}")]
    Launch {
        /// Task that failed to launch.
        task_id: TaskId,
        /// Underlying OS failure.
        #[source]
        source: io::Error,
    },

    /// The task spec violates its invariants.
    #[error("refusing to launch task {task_id}: {source}")]
    InvalidSpec {
        /// Offending task.
        task_id: TaskId,
        /// Violated invariant.
        #[source]
        source: TaskSpecError,
    },
}

/// How a worker ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Orderly exit.
    Success,
    /// Abnormal exit, with a description.
    Failure(String),
}

impl WorkerStatus {
    /// Check if the worker exited cleanly.
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerStatus::Success)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::Success => write!(f, "ok"),
            WorkerStatus::Failure(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Creates workers.
pub trait WorkerLauncher {
    /// Handle type for launched workers.
    type Handle: WorkerHandle;

    /// Launch a worker for `spec` using `seed` for its random draws.
    ///
    /// The worker starts idle and waits for [`Notification::Start`].
    fn launch(&self, spec: &TaskSpec, seed: u64) -> Result<Self::Handle, SpawnError>;
}

/// The orchestrator's view of one launched worker.
#[async_trait(?Send)]
pub trait WorkerHandle {
    /// Task the worker simulates.
    fn task_id(&self) -> TaskId;

    /// Deliver a notification. Fire-and-forget: returns once the notification
    /// is queued, not once it is handled.
    async fn notify(&mut self, notification: Notification) -> Result<(), NotifyError>;

    /// Whether the worker has already exited. Never blocks.
    fn has_exited(&mut self) -> bool;

    /// Wait for the worker to exit and collect its status.
    async fn wait(&mut self) -> WorkerStatus;
}
