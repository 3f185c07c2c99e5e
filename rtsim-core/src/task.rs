//! Task specifications.
//!
//! A [`TaskSpec`] is created once when the workload is loaded and copied into
//! the worker that simulates it. It is never mutated afterwards.

use std::fmt;
use std::time::Duration;

use crate::error::TaskSpecError;

/// Identifier of a simulated task, unique within a workload.
pub type TaskId = u32;

/// Closed interval `[min, max]`, in seconds, of a sampled timing parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower bound in seconds.
    pub min: f64,
    /// Upper bound in seconds.
    pub max: f64,
}

impl Bounds {
    /// Create an interval.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Create a degenerate interval that always samples `value`.
    pub const fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), TaskSpecError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(TaskSpecError::NotFinite { field });
        }
        if self.min < 0.0 {
            return Err(TaskSpecError::Negative {
                field,
                value: self.min,
            });
        }
        if self.min > self.max {
            return Err(TaskSpecError::InvertedBounds {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Immutable description of one periodic task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    /// Unique, positive task id.
    pub id: TaskId,
    /// Execution time of each job.
    pub exec: Bounds,
    /// Delay between consecutive job releases, measured release to release.
    pub inter_arrival: Bounds,
    /// Relative deadline in seconds. Informational: forwarded to the
    /// scheduler, never enforced by the worker.
    pub deadline: f64,
    /// Delay between the start notification and the first release.
    pub offset: Bounds,
}

impl TaskSpec {
    /// Check every invariant of the task description.
    pub fn validate(&self) -> Result<(), TaskSpecError> {
        if self.id == 0 {
            return Err(TaskSpecError::ZeroId);
        }
        self.exec.validate("execution time")?;
        self.inter_arrival.validate("inter-arrival time")?;
        if self.inter_arrival.max <= 0.0 {
            return Err(TaskSpecError::ZeroPeriod);
        }
        if !self.deadline.is_finite() {
            return Err(TaskSpecError::NotFinite { field: "deadline" });
        }
        if self.deadline <= 0.0 {
            return Err(TaskSpecError::NonPositiveDeadline(self.deadline));
        }
        self.offset.validate("offset")
    }

    /// The deadline as a [`Duration`], when representable.
    pub fn deadline_duration(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.deadline).ok()
    }

    /// Positional launch arguments for an out-of-process worker.
    ///
    /// Nine values in order: id, min/max execution, min/max inter-arrival,
    /// deadline, min/max offset and the worker's random seed. Floats use the
    /// shortest representation that parses back to the same value.
    pub fn launch_args(&self, seed: u64) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.exec.min.to_string(),
            self.exec.max.to_string(),
            self.inter_arrival.min.to_string(),
            self.inter_arrival.max.to_string(),
            self.deadline.to_string(),
            self.offset.min.to_string(),
            self.offset.max.to_string(),
            seed.to_string(),
        ]
    }
}

impl fmt::Display for TaskSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}\t{:.6}",
            self.id,
            self.exec.min,
            self.exec.max,
            self.inter_arrival.min,
            self.inter_arrival.max,
            self.deadline,
            self.offset.min,
            self.offset.max,
        )
    }
}
