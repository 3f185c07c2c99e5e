//! rtsim - run a periodic real-time workload.
//!
//! Loads a workload description, launches one worker per task and lets them
//! run for the declared duration. The run report is printed to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use rtsim::{
    BurnStrategy, Burner, Orchestrator, OrchestratorSettings, ProcessLauncher, RunError, RunReport,
    SpawnError, ThreadLauncher, TokioTimeProvider, WorkerLauncher, WorkerOptions, WorkloadConfig,
    load_config,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "rtsim")]
#[command(about = "Simulate a periodic real-time workload")]
struct Cli {
    /// Path to the workload description file
    config: PathBuf,

    /// Where workers run
    #[arg(long, value_enum, default_value_t = Backend::Process)]
    backend: Backend,

    /// Worker executable for the process backend (default: rtsim-task next to this binary)
    #[arg(long)]
    task_binary: Option<PathBuf>,

    /// Pause after each worker launch, in milliseconds
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// How execution time is turned into CPU work
    #[arg(long, value_enum, default_value_t = BurnStrategy::Calibrated)]
    burn: BurnStrategy,

    /// Seed for reproducible per-worker random draws
    #[arg(long)]
    seed: Option<u64>,

    /// Warn when a job takes longer than its task's deadline
    #[arg(long)]
    report_deadline_misses: bool,

    /// Validate and print the workload, then exit
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// One rtsim-task process per task
    Process,
    /// One thread per task inside this process
    Thread,
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
    match run(cli) {
        Ok(Some(report)) => {
            eprintln!("{report}");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Option<RunReport>, RunError> {
    let config = load_config(&cli.config)?;
    info!(
        tasks = config.tasks().len(),
        duration = ?config.duration(),
        "Loaded workload from {}",
        cli.config.display()
    );
    if cli.check {
        println!("{config}");
        return Ok(None);
    }

    let settings = OrchestratorSettings {
        settle_delay: Duration::from_millis(cli.settle_ms),
        seed: cli.seed,
    };
    let options = WorkerOptions {
        report_deadline_misses: cli.report_deadline_misses,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(RunError::Runtime)?;

    let report = match cli.backend {
        Backend::Thread => {
            let launcher = ThreadLauncher::new(Burner::for_strategy(cli.burn)).with_options(options);
            runtime.block_on(orchestrate(launcher, settings, &config))?
        }
        Backend::Process => {
            let program = match cli.task_binary {
                Some(program) => program,
                None => default_task_binary().map_err(RunError::TaskBinary)?,
            };
            let launcher = ProcessLauncher::new(program)
                .with_burn(cli.burn)
                .with_deadline_miss_reports(options.report_deadline_misses);
            runtime.block_on(orchestrate(launcher, settings, &config))?
        }
    };
    Ok(Some(report))
}

async fn orchestrate<L: WorkerLauncher>(
    launcher: L,
    settings: OrchestratorSettings,
    config: &WorkloadConfig,
) -> Result<RunReport, SpawnError> {
    let mut orchestrator = Orchestrator::new(launcher, TokioTimeProvider::new(), settings);

    let shutdown = orchestrator.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    orchestrator.run(config).await
}

fn default_task_binary() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe.with_file_name(format!("rtsim-task{}", std::env::consts::EXE_SUFFIX)))
}
