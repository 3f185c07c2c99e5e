//! Task workers.
//!
//! A worker simulates one periodic task: it waits for a start notification,
//! waits out its sampled offset, then releases jobs at sampled inter-arrival
//! intervals, burning CPU for a sampled execution time per job, until told to
//! stop.
//!
//! - [`state`]: the pure lifecycle state machine
//! - [`TaskWorker`]: the event loop that drives it
//! - [`Observation`]: what a worker reports, through an [`Observer`]

pub mod state;

mod driver;
mod observation;

pub use driver::{ExitReason, TaskRuntimeState, TaskWorker, WorkerExit, WorkerOptions};
pub use observation::{Observation, Observer};
pub use state::{Effect, Event, Phase, Transition, transition};
