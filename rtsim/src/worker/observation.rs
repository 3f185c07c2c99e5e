//! What a worker reports about its own behavior.

use std::fmt;
use std::time::Duration;

use rtsim_core::TaskId;
use tokio::sync::mpsc;

/// An observable worker event.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The start notification was accepted.
    TaskStarted {
        /// Reporting task.
        task_id: TaskId,
    },
    /// A job was released and began burning.
    JobStarted {
        /// Reporting task.
        task_id: TaskId,
        /// Job number, starting at 1.
        job_id: u64,
        /// Release time relative to the start notification.
        at: Duration,
    },
    /// A job ran to completion.
    JobFinished {
        /// Reporting task.
        task_id: TaskId,
        /// Job number.
        job_id: u64,
        /// Wall-clock time from release to completion, including any time
        /// spent suspended. Not CPU time.
        elapsed: Duration,
        /// Sampled execution time.
        requested: Duration,
    },
    /// A job was still burning when the next job was released. It is
    /// suspended and resumes once the newer jobs finish.
    JobPreempted {
        /// Reporting task.
        task_id: TaskId,
        /// Job number of the suspended job.
        job_id: u64,
        /// Wall-clock time since the job's release.
        elapsed: Duration,
        /// Sampled execution time.
        requested: Duration,
    },
    /// A finished job took longer than the task's deadline.
    DeadlineMissed {
        /// Reporting task.
        task_id: TaskId,
        /// Job number.
        job_id: u64,
        /// Measured wall-clock execution time.
        elapsed: Duration,
        /// The task's relative deadline.
        deadline: Duration,
    },
    /// The worker terminated.
    TaskStopped {
        /// Reporting task.
        task_id: TaskId,
        /// Jobs that ran to completion.
        jobs_completed: u64,
        /// Jobs that overran and were suspended.
        jobs_preempted: u64,
    },
    /// A recoverable problem, such as an unusable sampling interval.
    Warning {
        /// Reporting task.
        task_id: TaskId,
        /// Description of the problem.
        message: String,
    },
}

impl Observation {
    /// Task that produced this observation.
    pub fn task_id(&self) -> TaskId {
        match self {
            Observation::TaskStarted { task_id }
            | Observation::JobStarted { task_id, .. }
            | Observation::JobFinished { task_id, .. }
            | Observation::JobPreempted { task_id, .. }
            | Observation::DeadlineMissed { task_id, .. }
            | Observation::TaskStopped { task_id, .. }
            | Observation::Warning { task_id, .. } => *task_id,
        }
    }

    /// Whether the observation signals abnormal behavior.
    pub fn is_anomaly(&self) -> bool {
        matches!(
            self,
            Observation::JobPreempted { .. }
                | Observation::DeadlineMissed { .. }
                | Observation::Warning { .. }
        )
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::TaskStarted { task_id } => write!(f, "task {task_id} started"),
            Observation::JobStarted {
                task_id,
                job_id,
                at,
            } => write!(
                f,
                "job {task_id}.{job_id} started at {:.6}s",
                at.as_secs_f64()
            ),
            Observation::JobFinished {
                task_id,
                job_id,
                elapsed,
                requested,
            } => write!(
                f,
                "job {task_id}.{job_id} finished in {:.6}s wall-clock (requested {:.6}s)",
                elapsed.as_secs_f64(),
                requested.as_secs_f64()
            ),
            Observation::JobPreempted {
                task_id,
                job_id,
                elapsed,
                requested,
            } => write!(
                f,
                "job {task_id}.{job_id} overran: next release after {:.6}s of {:.6}s",
                elapsed.as_secs_f64(),
                requested.as_secs_f64()
            ),
            Observation::DeadlineMissed {
                task_id,
                job_id,
                elapsed,
                deadline,
            } => write!(
                f,
                "job {task_id}.{job_id} missed its deadline: {:.6}s > {:.6}s",
                elapsed.as_secs_f64(),
                deadline.as_secs_f64()
            ),
            Observation::TaskStopped {
                task_id,
                jobs_completed,
                jobs_preempted,
            } => write!(
                f,
                "task {task_id} finished ({jobs_completed} jobs completed, {jobs_preempted} preempted)"
            ),
            Observation::Warning { task_id, message } => write!(f, "task {task_id}: {message}"),
        }
    }
}

/// Destination of a worker's observations.
///
/// Every observation is logged. When a collector channel is attached, it is
/// also forwarded there; a closed collector is ignored.
#[derive(Debug, Clone, Default)]
pub struct Observer {
    collector: Option<mpsc::UnboundedSender<Observation>>,
}

impl Observer {
    /// Log observations only.
    pub fn logging() -> Self {
        Self::default()
    }

    /// Log observations and forward them to `collector`.
    pub fn with_collector(collector: mpsc::UnboundedSender<Observation>) -> Self {
        Self {
            collector: Some(collector),
        }
    }

    /// Report an observation.
    pub fn emit(&self, observation: Observation) {
        if observation.is_anomaly() {
            tracing::warn!("{observation}");
        } else {
            tracing::info!("{observation}");
        }
        if let Some(collector) = &self.collector {
            let _ = collector.send(observation);
        }
    }
}
