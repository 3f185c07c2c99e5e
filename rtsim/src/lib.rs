//! # rtsim
//!
//! Periodic real-time workload simulator.
//!
//! A workload file declares a set of periodic tasks and a total duration. The
//! orchestrator launches one worker per task, starts them together, lets them
//! run until the global timer fires, then stops and reaps them. Each worker
//! releases jobs at randomly sampled inter-arrival intervals and burns CPU for
//! a randomly sampled execution time per job, so the host's scheduler sees a
//! realistic periodic load.
//!
//! ## Core Components
//!
//! - [`WorkloadConfig`]: Parsed workload description ([`load_config`])
//! - [`Orchestrator`]: Spawn, start, wait, stop, reap
//! - [`TaskWorker`]: One task's lifecycle, driven by [`worker::transition`]
//! - [`WorkerLauncher`]: Thread or process backed worker creation
//! - [`Burner`]: Calibrated CPU burn
//!
//! ## Run Sequence
//!
//! ```text
//! load_config ─> arm global timer ─> spawn_all ─> Start ─> wait ─> Stop ─> reap_all
//!                     │                                      ▲
//!                     └──────────── duration ────────────────┘
//! ```
//!
//! The global timer is armed before the first launch, so the settle delay
//! between launches counts against the run duration.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rtsim::{Burner, Orchestrator, OrchestratorSettings, ThreadLauncher, load_config};
//! use rtsim_core::TokioTimeProvider;
//!
//! let config = load_config("workload.txt")?;
//! let launcher = ThreadLauncher::new(Burner::calibrate());
//! let mut orchestrator =
//!     Orchestrator::new(launcher, TokioTimeProvider::new(), OrchestratorSettings::default());
//! let report = orchestrator.run(&config).await?;
//! eprintln!("{report}");
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use rtsim_core::{
    Bounds, Notification, RandomProvider, SeededRandomProvider, TaskId, TaskSpec, TaskSpecError,
    TimeProvider, TokioTimeProvider,
};

/// Workload description loading.
pub mod config;

/// CPU burn used to simulate execution cost.
pub mod burn;

/// Deadline registration with the host scheduler.
pub mod scheduler;

/// Task workers and their lifecycle.
pub mod worker;

/// Thread and process worker launchers.
pub mod launch;

/// Simulation orchestration.
pub mod orchestrator;

/// Run summary.
pub mod report;

mod error;

pub use burn::{BurnStrategy, Burner};
pub use config::{ConfigError, MAX_TASKS, WorkloadConfig, load_config, parse_config};
pub use error::RunError;
pub use launch::{
    ProcessLauncher, SpawnError, ThreadLauncher, WorkerHandle, WorkerLauncher, WorkerStatus,
};
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use report::{RunReport, WorkerOutcome};
pub use scheduler::{BestEffortRegistrar, DeadlineRegistrar, RegistrationError};
pub use worker::{Observation, Observer, TaskWorker, WorkerOptions};
