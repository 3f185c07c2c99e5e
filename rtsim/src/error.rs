//! Top-level error type.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::launch::SpawnError;

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The workload description could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A worker could not be launched.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// The worker executable could not be located.
    #[error("cannot locate the rtsim-task binary: {0}")]
    TaskBinary(#[source] io::Error),

    /// The async runtime could not be built.
    #[error("failed to build runtime: {0}")]
    Runtime(#[source] io::Error),
}
