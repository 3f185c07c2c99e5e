//! Simulation orchestrator.
//!
//! The orchestrator owns the run: it arms the global timer, launches one
//! worker per task with a settle delay between launches, broadcasts `Start`,
//! waits for the global timer (or an interrupt), broadcasts `Stop` and reaps
//! every worker.
//!
//! Workers are only ever reached through their [`WorkerHandle`]; nothing is
//! shared with them beyond the notifications.

use std::time::Duration;

use futures::future::join_all;
use rtsim_core::{
    Notification, OneShotTimer, RandomProvider, SeededRandomProvider, TaskId, TimeProvider,
};
use tokio_util::sync::CancellationToken;

use crate::config::WorkloadConfig;
use crate::launch::{SpawnError, WorkerHandle, WorkerLauncher};
use crate::report::{RunReport, WorkerOutcome};

/// Orchestrator tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    /// Pause after each launch.
    pub settle_delay: Duration,
    /// Seed for the per-worker seeds. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            seed: None,
        }
    }
}

/// Drives one simulation run over workers created by `L`.
pub struct Orchestrator<L: WorkerLauncher, T: TimeProvider> {
    launcher: L,
    time: T,
    settings: OrchestratorSettings,
    seeds: SeededRandomProvider,
    workers: Vec<L::Handle>,
    global_timer: OneShotTimer,
    shutdown: CancellationToken,
    premature_exits: Vec<TaskId>,
    interrupted: bool,
}

impl<L: WorkerLauncher, T: TimeProvider> Orchestrator<L, T> {
    /// Create an orchestrator with no workers.
    pub fn new(launcher: L, time: T, settings: OrchestratorSettings) -> Self {
        let seeds = match settings.seed {
            Some(seed) => SeededRandomProvider::new(seed),
            None => SeededRandomProvider::from_entropy(),
        };
        tracing::debug!(seed = seeds.seed(), "Seeding worker RNGs");
        Self {
            launcher,
            time,
            settings,
            seeds,
            workers: Vec::new(),
            global_timer: OneShotTimer::new(),
            shutdown: CancellationToken::new(),
            premature_exits: Vec::new(),
            interrupted: false,
        }
    }

    /// Token that, once cancelled, ends [`await_completion`](Self::await_completion)
    /// early.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of live worker handles.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Run the whole sequence for `config` and summarize it.
    pub async fn run(&mut self, config: &WorkloadConfig) -> Result<RunReport, SpawnError> {
        let started = self.time.now();
        self.arm_global_timer(config.duration());
        self.spawn_all(config).await?;
        let spawned = self.workers.len();

        self.broadcast_start().await;
        self.await_completion().await;
        self.broadcast_stop().await;
        let outcomes = self.reap_all().await;
        tracing::info!("all tasks finished");

        Ok(RunReport {
            spawned,
            reaped: outcomes.len(),
            outcomes,
            premature_exits: self.premature_exits.clone(),
            wall_time: self.time.now().saturating_sub(started),
            interrupted: self.interrupted,
        })
    }

    /// Arm the single global timer `duration` from now.
    pub fn arm_global_timer(&mut self, duration: Duration) {
        tracing::info!(duration = ?duration, "Armed global timer");
        self.global_timer.arm(duration);
    }

    /// Launch one worker per task, in file order.
    ///
    /// On failure every worker launched so far is stopped and reaped before
    /// the error is returned.
    pub async fn spawn_all(&mut self, config: &WorkloadConfig) -> Result<(), SpawnError> {
        for spec in config.tasks() {
            let seed = self.seeds.random::<u64>();
            match self.launcher.launch(spec, seed) {
                Ok(handle) => {
                    tracing::info!(task_id = spec.id, "Spawned task");
                    self.workers.push(handle);
                }
                Err(e) => {
                    tracing::error!(task_id = spec.id, "{e}");
                    self.global_timer.disarm();
                    self.broadcast_stop().await;
                    self.reap_all().await;
                    return Err(e);
                }
            }
            if let Err(e) = self.time.sleep(self.settings.settle_delay).await {
                tracing::debug!(error = %e, "Settle delay cut short");
            }
        }
        Ok(())
    }

    /// Send `Start` to every worker.
    pub async fn broadcast_start(&mut self) {
        self.broadcast(Notification::Start).await;
    }

    /// Send `Stop` to every worker, first recording any that already exited.
    pub async fn broadcast_stop(&mut self) {
        self.detect_premature_exits();
        self.broadcast(Notification::Stop).await;
    }

    async fn broadcast(&mut self, notification: Notification) {
        tracing::debug!(%notification, workers = self.workers.len(), "Broadcasting");
        let results = join_all(
            self.workers
                .iter_mut()
                .map(|worker| async move { (worker.task_id(), worker.notify(notification).await) }),
        )
        .await;
        for (task_id, result) in results {
            if let Err(e) = result {
                tracing::debug!(task_id, %notification, "Notification not delivered: {e}");
            }
        }
    }

    fn detect_premature_exits(&mut self) {
        for worker in &mut self.workers {
            let task_id = worker.task_id();
            if !self.premature_exits.contains(&task_id) && worker.has_exited() {
                tracing::warn!(task_id, "Task exited before stop");
                self.premature_exits.push(task_id);
            }
        }
    }

    /// Block until the global timer expires or the shutdown token is
    /// cancelled.
    ///
    /// Returns immediately if the timer already expired, or was never armed.
    pub async fn await_completion(&mut self) {
        if !self.global_timer.is_armed() {
            tracing::warn!("Global timer is not armed, not waiting");
            return;
        }
        tokio::select! {
            biased;
            () = self.global_timer.expired() => {
                tracing::info!("Simulation duration elapsed");
            }
            () = self.shutdown.cancelled() => {
                tracing::warn!("Interrupted, stopping tasks early");
                self.interrupted = true;
            }
        }
    }

    /// Wait for every worker to exit, in launch order.
    ///
    /// A failed worker is logged and reaping continues.
    pub async fn reap_all(&mut self) -> Vec<WorkerOutcome> {
        let workers = std::mem::take(&mut self.workers);
        let mut outcomes = Vec::with_capacity(workers.len());
        for mut worker in workers {
            let task_id = worker.task_id();
            let status = worker.wait().await;
            if status.is_success() {
                tracing::debug!(task_id, "Reaped task");
            } else {
                tracing::warn!(task_id, %status, "Task exited abnormally");
            }
            outcomes.push(WorkerOutcome {
                task_id,
                exited_early: self.premature_exits.contains(&task_id),
                status,
            });
        }
        outcomes
    }
}
