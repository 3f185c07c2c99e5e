//! Worker process for one simulated task.
//!
//! Launched by `rtsim` with the task parameters as positional arguments.
//! Control notifications arrive as `start` / `stop` lines on stdin; end of
//! input is treated as a stop.

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use rtsim::{Bounds, BurnStrategy, Burner, TaskId, TaskSpec, TaskWorker, WorkerOptions};
use rtsim_core::{
    Notification, NotificationSender, SeededRandomProvider, TokioTimeProvider,
    notification_channel,
};
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rtsim-task")]
#[command(about = "Simulate one periodic task under the rtsim orchestrator")]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Task id
    id: TaskId,
    /// Minimum execution time, in seconds
    min_exec: f64,
    /// Maximum execution time, in seconds
    max_exec: f64,
    /// Minimum inter-arrival time, in seconds
    min_inter_arrival: f64,
    /// Maximum inter-arrival time, in seconds
    max_inter_arrival: f64,
    /// Relative deadline, in seconds
    deadline: f64,
    /// Minimum offset, in seconds
    min_offset: f64,
    /// Maximum offset, in seconds
    max_offset: f64,
    /// Seed for this worker's random draws
    seed: u64,

    /// How execution time is turned into CPU work
    #[arg(long, value_enum, default_value_t = BurnStrategy::Calibrated)]
    burn: BurnStrategy,

    /// Warn when a job takes longer than the deadline
    #[arg(long)]
    report_deadline_misses: bool,
}

impl Cli {
    fn spec(&self) -> TaskSpec {
        TaskSpec {
            id: self.id,
            exec: Bounds::new(self.min_exec, self.max_exec),
            inter_arrival: Bounds::new(self.min_inter_arrival, self.max_inter_arrival),
            deadline: self.deadline,
            offset: Bounds::new(self.min_offset, self.max_offset),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let spec = cli.spec();
    if let Err(e) = spec.validate() {
        error!("Invalid parameters for task {}: {e}", spec.id);
        return ExitCode::FAILURE;
    }

    let burner = Burner::for_strategy(cli.burn);
    let (sender, receiver) = notification_channel();
    if let Err(e) = thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || forward_stdin(sender))
    {
        error!("Failed to start stdin reader: {e}");
        return ExitCode::FAILURE;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to build runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let worker = TaskWorker::new(
        spec,
        receiver,
        TokioTimeProvider::new(),
        SeededRandomProvider::new(cli.seed),
    )
    .with_burner(burner)
    .with_options(WorkerOptions {
        report_deadline_misses: cli.report_deadline_misses,
    });
    let exit = runtime.block_on(worker.run());
    tracing::debug!(?exit, "Worker exited");
    ExitCode::SUCCESS
}

/// Turn stdin lines into notifications. Dropping the sender at end of input
/// disconnects the worker.
fn forward_stdin(sender: NotificationSender) {
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to read stdin: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Notification>() {
            Ok(notification) => {
                if sender.send(notification).is_err() {
                    break;
                }
            }
            Err(e) => warn!("Ignoring stdin line: {e}"),
        }
    }
}
