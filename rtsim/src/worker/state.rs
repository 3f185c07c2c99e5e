//! Worker lifecycle state machine.
//!
//! The lifecycle is a pure function of `(phase, event)`; the driver in
//! [`super::driver`] turns notifications, timer expiries and burn progress
//! into [`Event`]s and carries out the returned [`Effect`].
//!
//! # State Transitions
//!
//! ```text
//! Idle ──Start──> WaitingOffset ──timer──> RunningJob ──burn done──> WaitingNextArrival
//!                                          ▲  │ ▲                          │
//!                                          │  └─┘ timer (overrun),         │
//!                                          │      inner burn done          │
//!                                          └───────────────────────────timer
//!
//! any phase ──Stop / disconnect──> Terminated
//! ```
//!
//! # Preemption
//!
//! The next-arrival timer is armed when a job is released, so it can expire
//! while that job is still burning. That expiry preempts the burn
//! ([`Effect::SuspendAndRelease`]): the running job is reported as overrun and
//! set aside, and the next job is released immediately. When a job finishes
//! while older jobs are set aside ([`Event::InnerBurnCompleted`]), the most
//! recently suspended one resumes its remaining burn
//! ([`Effect::CompleteAndResume`]). A stop preempts a burn the same way but
//! ends the worker without recording the running or suspended jobs.

/// Lifecycle phase of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Launched, waiting for the start notification.
    Idle,
    /// Started, waiting for the sampled offset to elapse.
    WaitingOffset,
    /// Burning CPU for the current job.
    RunningJob,
    /// Job finished, waiting for the next release.
    WaitingNextArrival,
    /// Stopped. Terminal.
    Terminated,
}

impl Phase {
    /// Check if this is a terminal phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminated)
    }
}

/// Input to the lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// A start notification arrived.
    StartReceived,
    /// A stop notification arrived.
    StopReceived,
    /// Every notification sender is gone.
    Disconnected,
    /// The worker's own timer expired.
    TimerExpired,
    /// The running job finished its burn and no overrun job is suspended.
    BurnCompleted,
    /// The running job finished its burn while an overrun job is suspended.
    InnerBurnCompleted,
}

/// Action the driver performs when entering the next phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Sample the offset and arm the timer for it.
    ArmOffsetTimer,
    /// Arm the next-arrival timer, sample the execution time and begin a job.
    ReleaseJob,
    /// Report the running job as overrun and suspend it, then release the
    /// next one.
    SuspendAndRelease,
    /// Record the finished job.
    CompleteJob,
    /// Record the finished job, then resume the most recently suspended one.
    CompleteAndResume,
    /// Drop the running and suspended jobs unrecorded and exit.
    Terminate,
    /// The event has no meaning in the current phase.
    Ignore,
}

/// Result of applying an [`Event`] to a [`Phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Phase after the event.
    pub next: Phase,
    /// Effect to carry out.
    pub effect: Effect,
}

impl Transition {
    fn to(next: Phase, effect: Effect) -> Self {
        Self { next, effect }
    }

    fn stay(phase: Phase) -> Self {
        Self {
            next: phase,
            effect: Effect::Ignore,
        }
    }
}

/// Compute the next phase and effect.
pub fn transition(phase: Phase, event: Event) -> Transition {
    use Effect::*;
    use Event::*;
    use Phase::*;

    match (phase, event) {
        (Terminated, _) => Transition::stay(Terminated),
        (_, StopReceived | Disconnected) => Transition::to(Terminated, Terminate),
        (Idle, StartReceived) => Transition::to(WaitingOffset, ArmOffsetTimer),
        (WaitingOffset | WaitingNextArrival, TimerExpired) => {
            Transition::to(RunningJob, ReleaseJob)
        }
        (RunningJob, TimerExpired) => Transition::to(RunningJob, SuspendAndRelease),
        (RunningJob, BurnCompleted) => Transition::to(WaitingNextArrival, CompleteJob),
        (RunningJob, InnerBurnCompleted) => Transition::to(RunningJob, CompleteAndResume),
        (phase, _) => Transition::stay(phase),
    }
}
