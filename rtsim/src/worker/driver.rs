//! Worker event loop.
//!
//! [`TaskWorker::run`] owns everything a worker touches: its spec, its timer,
//! its random generator and its runtime counters. Nothing is shared with the
//! orchestrator; the only inputs are the notification channel and the
//! worker's own timer.
//!
//! While idle or waiting, the loop suspends on whichever of the two fires
//! first, with notifications taking priority. While a job burns, the loop
//! burns one slice at a time and polls both sources between slices, so a stop
//! or the next release preempts the burn within one slice.
//!
//! A job preempted by the next release is pushed onto a stack of suspended
//! jobs. Once the newer job finishes, the most recently suspended job resumes
//! with whatever burn it had left.

use std::sync::Arc;
use std::time::Duration;

use rtsim_core::{
    Bounds, Notification, NotificationReceiver, OneShotTimer, RandomProvider, TaskSpec,
    TimeProvider, uniform,
};

use super::observation::{Observation, Observer};
use super::state::{Effect, Event, Phase, Transition, transition};
use crate::burn::{Burn, Burner};
use crate::scheduler::{BestEffortRegistrar, DeadlineRegistrar};

/// Worker tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Report jobs whose measured execution time exceeds the deadline.
    pub report_deadline_misses: bool,
}

/// Transient per-worker state. Never visible outside the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRuntimeState {
    /// Number of the next job to release, starting at 1.
    pub job_id: u64,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Jobs that ran to completion.
    pub jobs_completed: u64,
    /// Jobs that overran and were suspended by the next release.
    pub jobs_preempted: u64,
}

impl Default for TaskRuntimeState {
    fn default() -> Self {
        Self {
            job_id: 1,
            phase: Phase::Idle,
            jobs_completed: 0,
            jobs_preempted: 0,
        }
    }
}

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A stop notification arrived.
    Stopped,
    /// The notification channel closed without a stop.
    Disconnected,
}

/// Summary returned when a worker terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    /// Why the worker stopped.
    pub reason: ExitReason,
    /// Jobs that ran to completion.
    pub jobs_completed: u64,
    /// Jobs that overran and were suspended by the next release.
    pub jobs_preempted: u64,
}

struct ActiveJob {
    id: u64,
    started: Duration,
    requested: Duration,
    burn: Burn,
}

/// One simulated periodic task.
pub struct TaskWorker<T: TimeProvider, R: RandomProvider> {
    spec: TaskSpec,
    time: T,
    random: R,
    notifications: NotificationReceiver,
    burner: Burner,
    observer: Observer,
    registrar: Arc<dyn DeadlineRegistrar>,
    options: WorkerOptions,
    timer: OneShotTimer,
    state: TaskRuntimeState,
    job: Option<ActiveJob>,
    suspended: Vec<ActiveJob>,
    started_at: Duration,
}

impl<T: TimeProvider, R: RandomProvider> TaskWorker<T, R> {
    /// Create an idle worker.
    ///
    /// Defaults to a spinning burner, logging-only observations and the
    /// best-effort deadline registrar.
    pub fn new(spec: TaskSpec, notifications: NotificationReceiver, time: T, random: R) -> Self {
        Self {
            spec,
            time,
            random,
            notifications,
            burner: Burner::spin(),
            observer: Observer::logging(),
            registrar: Arc::new(BestEffortRegistrar),
            options: WorkerOptions::default(),
            timer: OneShotTimer::new(),
            state: TaskRuntimeState::default(),
            job: None,
            suspended: Vec::new(),
            started_at: Duration::ZERO,
        }
    }

    /// Use `burner` to simulate execution cost.
    pub fn with_burner(mut self, burner: Burner) -> Self {
        self.burner = burner;
        self
    }

    /// Send observations to `observer`.
    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Register the deadline through `registrar`.
    pub fn with_registrar(mut self, registrar: Arc<dyn DeadlineRegistrar>) -> Self {
        self.registrar = registrar;
        self
    }

    /// Apply worker tunables.
    pub fn with_options(mut self, options: WorkerOptions) -> Self {
        self.options = options;
        self
    }

    /// The task this worker simulates.
    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    /// Snapshot of the runtime counters.
    pub fn state(&self) -> TaskRuntimeState {
        self.state
    }

    /// Run the lifecycle until stopped.
    #[tracing::instrument(name = "task", skip(self), fields(id = self.spec.id))]
    pub async fn run(mut self) -> WorkerExit {
        self.register_deadline();
        loop {
            let event = self.next_event().await;
            if let Some(exit) = self.handle(event) {
                return exit;
            }
        }
    }

    fn register_deadline(&self) {
        let Some(deadline) = self.spec.deadline_duration() else {
            self.warn(format!("unusable deadline {}", self.spec.deadline));
            return;
        };
        match self.registrar.register_deadline(self.spec.id, deadline) {
            Ok(()) => tracing::info!(deadline = ?deadline, "Registered deadline with scheduler"),
            Err(e) => tracing::info!("{e}; running at default priority"),
        }
    }

    async fn next_event(&mut self) -> Event {
        if self.job.is_some() {
            return self.burn_until_event();
        }
        tokio::select! {
            biased;
            notification = self.notifications.recv() => match notification {
                Some(notification) => event_for(notification),
                None => Event::Disconnected,
            },
            () = self.timer.expired() => Event::TimerExpired,
        }
    }

    /// Burn the current job slice by slice until something preempts it or it
    /// completes.
    fn burn_until_event(&mut self) -> Event {
        loop {
            match self.notifications.try_recv() {
                Ok(Some(notification)) => return event_for(notification),
                Ok(None) => {}
                Err(_) => return Event::Disconnected,
            }
            if self.timer.take_due() {
                return Event::TimerExpired;
            }
            let done = match self.job.as_mut() {
                Some(job) => job.burn.step(),
                None => true,
            };
            if done {
                return if self.suspended.is_empty() {
                    Event::BurnCompleted
                } else {
                    Event::InnerBurnCompleted
                };
            }
        }
    }

    fn handle(&mut self, event: Event) -> Option<WorkerExit> {
        let Transition { next, effect } = transition(self.state.phase, event);
        tracing::trace!(from = ?self.state.phase, ?event, to = ?next, ?effect, "Transition");
        self.state.phase = next;

        match effect {
            Effect::ArmOffsetTimer => self.start(),
            Effect::ReleaseJob => self.release_job(),
            Effect::SuspendAndRelease => {
                self.suspend_job();
                self.release_job();
            }
            Effect::CompleteJob => self.complete_job(),
            Effect::CompleteAndResume => {
                self.complete_job();
                self.resume_job();
            }
            Effect::Terminate => return Some(self.terminate(event)),
            Effect::Ignore => tracing::debug!(phase = ?next, ?event, "Ignoring event"),
        }
        None
    }

    fn start(&mut self) {
        self.started_at = self.time.now();
        self.observer.emit(Observation::TaskStarted {
            task_id: self.spec.id,
        });
        let offset = self.sample(self.spec.offset, "offset");
        self.timer.arm(offset);
    }

    fn release_job(&mut self) {
        // The next release is measured from this job's start, not its end.
        let arrival = self.sample(self.spec.inter_arrival, "inter-arrival time");
        self.timer.arm(arrival);

        let requested = self.sample(self.spec.exec, "execution time");
        let now = self.time.now();
        let id = self.state.job_id;
        self.state.job_id += 1;
        self.observer.emit(Observation::JobStarted {
            task_id: self.spec.id,
            job_id: id,
            at: now.saturating_sub(self.started_at),
        });
        self.job = Some(ActiveJob {
            id,
            started: now,
            requested,
            burn: self.burner.start(requested),
        });
    }

    fn complete_job(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };
        let elapsed = self.time.now().saturating_sub(job.started);
        self.observer.emit(Observation::JobFinished {
            task_id: self.spec.id,
            job_id: job.id,
            elapsed,
            requested: job.requested,
        });
        if self.options.report_deadline_misses {
            if let Some(deadline) = self.spec.deadline_duration() {
                if elapsed > deadline {
                    self.observer.emit(Observation::DeadlineMissed {
                        task_id: self.spec.id,
                        job_id: job.id,
                        elapsed,
                        deadline,
                    });
                }
            }
        }
        self.state.jobs_completed += 1;
    }

    fn suspend_job(&mut self) {
        let Some(job) = self.job.take() else {
            return;
        };
        self.observer.emit(Observation::JobPreempted {
            task_id: self.spec.id,
            job_id: job.id,
            elapsed: self.time.now().saturating_sub(job.started),
            requested: job.requested,
        });
        self.state.jobs_preempted += 1;
        self.suspended.push(job);
    }

    fn resume_job(&mut self) {
        self.job = self.suspended.pop();
        if let Some(job) = &self.job {
            tracing::debug!(job_id = job.id, suspended = self.suspended.len(), "Resuming job");
        }
    }

    fn terminate(&mut self, event: Event) -> WorkerExit {
        if event == Event::Disconnected {
            tracing::info!("Notification channel closed, stopping");
        }
        self.timer.disarm();
        self.job = None;
        self.suspended.clear();
        self.observer.emit(Observation::TaskStopped {
            task_id: self.spec.id,
            jobs_completed: self.state.jobs_completed,
            jobs_preempted: self.state.jobs_preempted,
        });
        WorkerExit {
            reason: if event == Event::Disconnected {
                ExitReason::Disconnected
            } else {
                ExitReason::Stopped
            },
            jobs_completed: self.state.jobs_completed,
            jobs_preempted: self.state.jobs_preempted,
        }
    }

    /// Sample a timing parameter. An unusable interval falls back to its lower
    /// bound, or zero, and is reported as a warning. A value too large for a
    /// `Duration` saturates.
    fn sample(&mut self, bounds: Bounds, what: &str) -> Duration {
        let seconds = match uniform(&mut self.random, bounds) {
            Ok(seconds) => seconds,
            Err(e) => {
                let fallback = if bounds.min.is_finite() && bounds.min >= 0.0 {
                    bounds.min
                } else {
                    0.0
                };
                self.warn(format!("{what}: {e}; using {fallback}s"));
                fallback
            }
        };
        match Duration::try_from_secs_f64(seconds) {
            Ok(duration) => duration,
            Err(_) if seconds > 0.0 => Duration::MAX,
            Err(e) => {
                self.warn(format!("{what}: {e}; using 0s"));
                Duration::ZERO
            }
        }
    }

    fn warn(&self, message: String) {
        self.observer.emit(Observation::Warning {
            task_id: self.spec.id,
            message,
        });
    }
}

fn event_for(notification: Notification) -> Event {
    match notification {
        Notification::Start => Event::StartReceived,
        Notification::Stop => Event::StopReceived,
    }
}
