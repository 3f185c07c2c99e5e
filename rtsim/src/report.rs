//! Run summary.

use std::fmt;
use std::time::Duration;

use rtsim_core::TaskId;

use crate::launch::WorkerStatus;

/// Final state of one reaped worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerOutcome {
    /// Task the worker simulated.
    pub task_id: TaskId,
    /// How the worker exited.
    pub status: WorkerStatus,
    /// Whether the worker was gone before the stop broadcast.
    pub exited_early: bool,
}

/// Report of one orchestrated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Number of workers launched
    pub spawned: usize,
    /// Number of workers reaped
    pub reaped: usize,
    /// Per-worker outcomes, in launch order
    pub outcomes: Vec<WorkerOutcome>,
    /// Tasks whose worker exited before the stop broadcast
    pub premature_exits: Vec<TaskId>,
    /// Wall-clock time from arming the global timer to the last reap
    pub wall_time: Duration,
    /// Whether the run was cut short by an interrupt
    pub interrupted: bool,
}

impl RunReport {
    /// Number of workers that exited abnormally.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !o.status.is_success())
            .count()
    }

    /// Check if every worker was reaped with a clean exit.
    pub fn all_succeeded(&self) -> bool {
        self.reaped == self.spawned && self.failed() == 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Run Report ===")?;
        writeln!(f, "Tasks spawned: {}", self.spawned)?;
        writeln!(f, "Tasks reaped: {}", self.reaped)?;
        writeln!(f, "Failed: {}", self.failed())?;
        writeln!(f, "Wall Time: {:?}", self.wall_time)?;
        if self.interrupted {
            writeln!(f, "Interrupted: yes")?;
        }

        if !self.premature_exits.is_empty() {
            writeln!(f)?;
            writeln!(f, "=== Premature Exits ===")?;
            for task_id in &self.premature_exits {
                writeln!(f, "  - task {task_id}")?;
            }
        }

        if !self.outcomes.is_empty() {
            writeln!(f)?;
            writeln!(f, "=== Workers ===")?;
            for outcome in &self.outcomes {
                writeln!(f, "  task {}: {}", outcome.task_id, outcome.status)?;
            }
        }

        writeln!(f)?;
        write!(f, "all tasks finished")
    }
}
