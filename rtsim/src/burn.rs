//! Synchronous CPU burn used to simulate job execution cost.
//!
//! A job occupies the CPU for its sampled execution time. The burn is split
//! into slices of roughly one millisecond so the worker driver can check for
//! preempting events between slices.
//!
//! Two strategies exist:
//!
//! - [`BurnStrategy::Calibrated`]: measure at startup how many loop iterations
//!   fit in a fixed wall-clock window, then burn that many iterations per
//!   simulated millisecond. Under CPU contention a job takes longer than
//!   requested, which is what the observed elapsed time reports.
//! - [`BurnStrategy::Spin`]: busy-spin against the monotonic clock until the
//!   requested time has been spent spinning.
//!
//! Both strategies only count work actually done, so a burn that is set
//! aside while a newer job runs picks up where it left off.

use std::hint;
use std::time::{Duration, Instant};

/// Window used to measure loop throughput at startup.
const CALIBRATION_WINDOW: Duration = Duration::from_millis(50);

/// Iterations per throughput sample during calibration.
const CALIBRATION_CHUNK: u64 = 10_000;

/// Granularity at which a burn can be preempted.
const SLICE: Duration = Duration::from_millis(1);

/// How a [`Burner`] converts requested time into CPU work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BurnStrategy {
    /// Iteration count self-calibrated at startup.
    #[default]
    Calibrated,
    /// Busy-spin against the monotonic clock.
    Spin,
}

impl BurnStrategy {
    /// Command-line spelling of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            BurnStrategy::Calibrated => "calibrated",
            BurnStrategy::Spin => "spin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Calibrated { iterations_per_ms: u64 },
    Spin,
}

/// Factory for [`Burn`]s. Cheap to copy into every worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burner {
    mode: Mode,
}

impl Burner {
    /// Build a burner for `strategy`, calibrating if required.
    pub fn for_strategy(strategy: BurnStrategy) -> Self {
        match strategy {
            BurnStrategy::Calibrated => Self::calibrate(),
            BurnStrategy::Spin => Self::spin(),
        }
    }

    /// Measure loop throughput on the current thread.
    pub fn calibrate() -> Self {
        let start = Instant::now();
        let mut iterations = 0u64;
        while start.elapsed() < CALIBRATION_WINDOW {
            spin_iterations(CALIBRATION_CHUNK);
            iterations += CALIBRATION_CHUNK;
        }
        let elapsed_us = u64::try_from(start.elapsed().as_micros())
            .unwrap_or(u64::MAX)
            .max(1);
        let iterations_per_ms = iterations.saturating_mul(1000) / elapsed_us;
        tracing::debug!(iterations_per_ms, "Calibrated CPU burn");
        Self::with_iterations_per_ms(iterations_per_ms)
    }

    /// Use a known throughput instead of calibrating.
    pub fn with_iterations_per_ms(iterations_per_ms: u64) -> Self {
        Self {
            mode: Mode::Calibrated {
                iterations_per_ms: iterations_per_ms.max(1),
            },
        }
    }

    /// Busy-spin against the clock.
    pub fn spin() -> Self {
        Self { mode: Mode::Spin }
    }

    /// Begin burning for `duration` of simulated execution time.
    pub fn start(&self, duration: Duration) -> Burn {
        let slices = (duration.as_secs_f64() * 1000.0).round() as u64;
        Burn {
            mode: self.mode,
            remaining_slices: slices,
            remaining: duration,
        }
    }
}

/// An in-progress burn, advanced one slice at a time.
#[derive(Debug)]
pub struct Burn {
    mode: Mode,
    remaining_slices: u64,
    remaining: Duration,
}

impl Burn {
    /// Burn one slice. Returns `true` once the whole burn has completed.
    pub fn step(&mut self) -> bool {
        match self.mode {
            Mode::Calibrated { iterations_per_ms } => {
                if self.remaining_slices > 0 {
                    spin_iterations(iterations_per_ms);
                    self.remaining_slices -= 1;
                }
                self.remaining_slices == 0
            }
            Mode::Spin => {
                let slice = self.remaining.min(SLICE);
                let start = Instant::now();
                while start.elapsed() < slice {
                    hint::spin_loop();
                }
                self.remaining = self.remaining.saturating_sub(start.elapsed());
                self.remaining.is_zero()
            }
        }
    }
}

fn spin_iterations(count: u64) {
    for i in 0..count {
        hint::black_box(i);
    }
}
