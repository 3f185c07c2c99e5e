//! In-process workers, one OS thread each.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use rtsim_core::{
    Notification, NotificationSender, NotifyError, SeededRandomProvider, TaskId, TaskSpec,
    TokioTimeProvider, notification_channel,
};

use super::{SpawnError, WorkerHandle, WorkerLauncher, WorkerStatus};
use crate::burn::Burner;
use crate::scheduler::{BestEffortRegistrar, DeadlineRegistrar};
use crate::worker::{Observer, TaskWorker, WorkerExit, WorkerOptions};

/// Runs each worker on a dedicated thread with its own current-thread
/// runtime, so a burning worker never stalls the orchestrator.
#[derive(Clone)]
pub struct ThreadLauncher {
    burner: Burner,
    observer: Observer,
    registrar: Arc<dyn DeadlineRegistrar>,
    options: WorkerOptions,
}

impl ThreadLauncher {
    /// Create a launcher whose workers burn with `burner`.
    pub fn new(burner: Burner) -> Self {
        Self {
            burner,
            observer: Observer::logging(),
            registrar: Arc::new(BestEffortRegistrar),
            options: WorkerOptions::default(),
        }
    }

    /// Give every worker a clone of `observer`.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Register deadlines through `registrar`.
    pub fn with_registrar(mut self, registrar: Arc<dyn DeadlineRegistrar>) -> Self {
        self.registrar = registrar;
        self
    }

    /// Apply worker tunables.
    pub fn with_options(mut self, options: WorkerOptions) -> Self {
        self.options = options;
        self
    }
}

impl WorkerLauncher for ThreadLauncher {
    type Handle = ThreadHandle;

    fn launch(&self, spec: &TaskSpec, seed: u64) -> Result<ThreadHandle, SpawnError> {
        let task_id = spec.id;
        spec.validate()
            .map_err(|source| SpawnError::InvalidSpec { task_id, source })?;

        let (sender, receiver) = notification_channel();
        let worker = TaskWorker::new(
            spec.clone(),
            receiver,
            TokioTimeProvider::new(),
            SeededRandomProvider::new(seed),
        )
        .with_burner(self.burner)
        .with_observer(self.observer.clone())
        .with_registrar(Arc::clone(&self.registrar))
        .with_options(self.options);

        let thread = thread::Builder::new()
            .name(format!("rtsim-task-{task_id}"))
            .spawn(move || -> Result<WorkerExit, String> {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .map_err(|e| format!("failed to build worker runtime: {e}"))?;
                Ok(runtime.block_on(worker.run()))
            })
            .map_err(|source| SpawnError::Launch { task_id, source })?;

        tracing::debug!(task_id, seed, "Launched worker thread");
        Ok(ThreadHandle {
            task_id,
            sender: Some(sender),
            thread: Some(thread),
            status: None,
            exit: None,
        })
    }
}

/// Handle to a worker thread.
pub struct ThreadHandle {
    task_id: TaskId,
    sender: Option<NotificationSender>,
    thread: Option<JoinHandle<Result<WorkerExit, String>>>,
    status: Option<WorkerStatus>,
    exit: Option<WorkerExit>,
}

impl ThreadHandle {
    /// Job counters reported by the worker, once it has been reaped cleanly.
    pub fn exit(&self) -> Option<WorkerExit> {
        self.exit
    }
}

#[async_trait(?Send)]
impl WorkerHandle for ThreadHandle {
    fn task_id(&self) -> TaskId {
        self.task_id
    }

    async fn notify(&mut self, notification: Notification) -> Result<(), NotifyError> {
        let sender = self.sender.as_ref().ok_or(NotifyError::Disconnected)?;
        sender.send(notification)?;
        if notification == Notification::Stop {
            self.sender = None;
        }
        Ok(())
    }

    fn has_exited(&mut self) -> bool {
        self.status.is_some() || self.thread.as_ref().is_some_and(|t| t.is_finished())
    }

    async fn wait(&mut self) -> WorkerStatus {
        if let Some(status) = &self.status {
            return status.clone();
        }
        let status = match self.thread.take() {
            Some(thread) => match tokio::task::spawn_blocking(move || thread.join()).await {
                Ok(Ok(Ok(exit))) => {
                    self.exit = Some(exit);
                    WorkerStatus::Success
                }
                Ok(Ok(Err(reason))) => WorkerStatus::Failure(reason),
                Ok(Err(_)) => WorkerStatus::Failure("worker thread panicked".to_string()),
                Err(e) => WorkerStatus::Failure(format!("failed to join worker thread: {e}")),
            },
            None => WorkerStatus::Failure("worker thread already reaped".to_string()),
        };
        self.status = Some(status.clone());
        status
    }
}
