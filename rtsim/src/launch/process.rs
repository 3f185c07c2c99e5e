//! Out-of-process workers.
//!
//! Each worker is an `rtsim-task` child process. The task parameters and seed
//! travel as positional arguments; notifications travel as `start` / `stop`
//! lines on the child's stdin. Closing stdin without a `stop` line counts as
//! a disconnect, which the worker also treats as a stop.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use rtsim_core::{Notification, NotifyError, TaskId, TaskSpec};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};

use super::{SpawnError, WorkerHandle, WorkerLauncher, WorkerStatus};
use crate::burn::BurnStrategy;

/// Launches `rtsim-task` processes.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
    burn: BurnStrategy,
    report_deadline_misses: bool,
}

impl ProcessLauncher {
    /// Launch workers from the executable at `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            burn: BurnStrategy::default(),
            report_deadline_misses: false,
        }
    }

    /// Burn strategy passed to every worker.
    pub fn with_burn(mut self, burn: BurnStrategy) -> Self {
        self.burn = burn;
        self
    }

    /// Ask workers to report deadline misses.
    pub fn with_deadline_miss_reports(mut self, enabled: bool) -> Self {
        self.report_deadline_misses = enabled;
        self
    }
}

impl WorkerLauncher for ProcessLauncher {
    type Handle = ProcessHandle;

    fn launch(&self, spec: &TaskSpec, seed: u64) -> Result<ProcessHandle, SpawnError> {
        let task_id = spec.id;
        spec.validate()
            .map_err(|source| SpawnError::InvalidSpec { task_id, source })?;

        let mut command = Command::new(&self.program);
        command
            .args(spec.launch_args(seed))
            .arg("--burn")
            .arg(self.burn.as_str());
        if self.report_deadline_misses {
            command.arg("--report-deadline-misses");
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|source| SpawnError::Launch { task_id, source })?;
        tracing::debug!(task_id, pid = ?child.id(), "Launched worker process");

        Ok(ProcessHandle {
            task_id,
            stdin: child.stdin.take(),
            child,
            status: None,
        })
    }
}

/// Handle to a worker process.
#[derive(Debug)]
pub struct ProcessHandle {
    task_id: TaskId,
    child: Child,
    stdin: Option<ChildStdin>,
    status: Option<WorkerStatus>,
}

#[async_trait(?Send)]
impl WorkerHandle for ProcessHandle {
    fn task_id(&self) -> TaskId {
        self.task_id
    }

    async fn notify(&mut self, notification: Notification) -> Result<(), NotifyError> {
        let stdin = self.stdin.as_mut().ok_or(NotifyError::Disconnected)?;
        let line = format!("{notification}\n");
        let written = match stdin.write_all(line.as_bytes()).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            tracing::debug!(task_id = self.task_id, error = %e, "Worker stdin closed");
            self.stdin = None;
            return Err(NotifyError::Disconnected);
        }
        if notification == Notification::Stop {
            self.stdin = None;
        }
        Ok(())
    }

    fn has_exited(&mut self) -> bool {
        if self.status.is_some() {
            return true;
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.status = Some(status_of(status));
                true
            }
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(task_id = self.task_id, error = %e, "Failed to poll worker process");
                false
            }
        }
    }

    async fn wait(&mut self) -> WorkerStatus {
        if let Some(status) = &self.status {
            return status.clone();
        }
        self.stdin = None;
        let status = match self.child.wait().await {
            Ok(status) => status_of(status),
            Err(e) => WorkerStatus::Failure(format!("failed to wait for worker process: {e}")),
        };
        self.status = Some(status.clone());
        status
    }
}

fn status_of(status: ExitStatus) -> WorkerStatus {
    if status.success() {
        WorkerStatus::Success
    } else {
        WorkerStatus::Failure(status.to_string())
    }
}
