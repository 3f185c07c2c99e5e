//! Workload description loading.
//!
//! The file format is line oriented. The first non-blank line is the total
//! simulation duration in whole seconds. Every following non-blank line is one
//! task made of eight tab-separated fields:
//!
//! ```text
//! id  min_exec  max_exec  min_inter_arrival  max_inter_arrival  deadline  min_offset  max_offset
//! ```
//!
//! Malformed input is always an error naming the offending line; nothing is
//! silently defaulted.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rtsim_core::{Bounds, TaskId, TaskSpec, TaskSpecError};
use thiserror::Error;

/// Maximum number of tasks a workload may declare.
pub const MAX_TASKS: usize = 20;

/// Number of tab-separated fields on a task line.
const TASK_FIELDS: usize = 8;

/// Errors raised while loading a workload description.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The workload file does not exist.
    #[error("workload file not found: {}", path.display())]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The workload file exists but could not be read.
    #[error("failed to read workload file {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A line is malformed or violates a task constraint.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number in the source.
        line: usize,
        /// What is wrong with the line.
        reason: String,
    },

    /// More than [`MAX_TASKS`] tasks were declared.
    #[error("too many tasks: at most {max} are supported")]
    TooManyTasks {
        /// The task limit.
        max: usize,
    },

    /// Two tasks share an id.
    #[error("duplicate task id {id}")]
    DuplicateId {
        /// The repeated id.
        id: TaskId,
    },

    /// The source contains no duration line.
    #[error("workload declares no simulation duration")]
    MissingDuration,

    /// A programmatically built task violates its invariants.
    #[error("task {id}: {source}")]
    InvalidTask {
        /// Id of the offending task.
        id: TaskId,
        /// The violated invariant.
        #[source]
        source: TaskSpecError,
    },
}

/// Parsed description of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadConfig {
    duration: Duration,
    tasks: Vec<TaskSpec>,
}

impl WorkloadConfig {
    /// Build a config from already-constructed specs, enforcing every
    /// invariant the file loader enforces.
    pub fn new(duration: Duration, tasks: Vec<TaskSpec>) -> Result<Self, ConfigError> {
        if duration.is_zero() {
            return Err(ConfigError::MissingDuration);
        }
        if tasks.len() > MAX_TASKS {
            return Err(ConfigError::TooManyTasks { max: MAX_TASKS });
        }
        let mut seen = HashSet::with_capacity(tasks.len());
        for spec in &tasks {
            spec.validate().map_err(|source| ConfigError::InvalidTask {
                id: spec.id,
                source,
            })?;
            if !seen.insert(spec.id) {
                return Err(ConfigError::DuplicateId { id: spec.id });
            }
        }
        Ok(Self { duration, tasks })
    }

    /// Total wall-clock budget of the simulation.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }
}

impl FromStr for WorkloadConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_config(s)
    }
}

impl fmt::Display for WorkloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Workload ===")?;
        writeln!(f, "Duration: {}s", self.duration.as_secs())?;
        writeln!(f, "Tasks: {}", self.tasks.len())?;
        writeln!(f, "id\tmin_c\t\tmax_c\t\tmin_t\t\tmax_t\t\tdeadl\t\tmin_o\t\tmax_o")?;
        for spec in &self.tasks {
            writeln!(f, "{spec}")?;
        }
        Ok(())
    }
}

/// Read and parse a workload description file.
pub fn load_config(path: impl AsRef<Path>) -> Result<WorkloadConfig, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let config = parse_config(&text)?;
    tracing::debug!(
        path = %path.display(),
        tasks = config.tasks.len(),
        duration_secs = config.duration.as_secs(),
        "Loaded workload"
    );
    Ok(config)
}

/// Parse a workload description from text.
pub fn parse_config(text: &str) -> Result<WorkloadConfig, ConfigError> {
    let mut duration = None;
    let mut tasks: Vec<TaskSpec> = Vec::new();
    let mut seen = HashSet::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() {
            continue;
        }

        if duration.is_none() {
            duration = Some(parse_duration(content, line)?);
            continue;
        }

        if tasks.len() == MAX_TASKS {
            return Err(ConfigError::TooManyTasks { max: MAX_TASKS });
        }
        let spec = parse_task(content, line)?;
        if !seen.insert(spec.id) {
            return Err(ConfigError::DuplicateId { id: spec.id });
        }
        tasks.push(spec);
    }

    let duration = duration.ok_or(ConfigError::MissingDuration)?;
    Ok(WorkloadConfig { duration, tasks })
}

fn parse_duration(content: &str, line: usize) -> Result<Duration, ConfigError> {
    let secs: u64 = content.parse().map_err(|_| ConfigError::Parse {
        line,
        reason: format!("expected a whole number of seconds, found `{content}`"),
    })?;
    if secs == 0 {
        return Err(ConfigError::Parse {
            line,
            reason: "simulation duration must be positive".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn parse_task(content: &str, line: usize) -> Result<TaskSpec, ConfigError> {
    let fields: Vec<&str> = content.split('\t').map(str::trim).collect();
    if fields.len() != TASK_FIELDS {
        return Err(ConfigError::Parse {
            line,
            reason: format!(
                "expected {TASK_FIELDS} tab-separated fields, found {}",
                fields.len()
            ),
        });
    }

    let id: TaskId = fields[0].parse().map_err(|_| ConfigError::Parse {
        line,
        reason: format!("invalid task id `{}`", fields[0]),
    })?;
    let number = |position: usize, name: &str| -> Result<f64, ConfigError> {
        fields[position].parse().map_err(|_| ConfigError::Parse {
            line,
            reason: format!("invalid {name} `{}`", fields[position]),
        })
    };

    let spec = TaskSpec {
        id,
        exec: Bounds::new(number(1, "min_exec")?, number(2, "max_exec")?),
        inter_arrival: Bounds::new(
            number(3, "min_inter_arrival")?,
            number(4, "max_inter_arrival")?,
        ),
        deadline: number(5, "deadline")?,
        offset: Bounds::new(number(6, "min_offset")?, number(7, "max_offset")?),
    };
    spec.validate().map_err(|e| ConfigError::Parse {
        line,
        reason: format!("task {id}: {e}"),
    })?;
    Ok(spec)
}
