//! Spawn failures, premature exits and interrupts.

use std::time::Duration;

use rtsim::{
    Burner, Observation, Observer, Orchestrator, SpawnError, ThreadLauncher,
    TokioTimeProvider, WorkerLauncher, WorkloadConfig,
};
use tokio::sync::mpsc;

use super::{ScriptedLauncher, periodic, quick_settings};

/// Thread launcher that refuses one task.
struct RefusingLauncher {
    inner: ThreadLauncher,
    refuse: u32,
}

impl WorkerLauncher for RefusingLauncher {
    type Handle = <ThreadLauncher as WorkerLauncher>::Handle;

    fn launch(&self, spec: &rtsim::TaskSpec, seed: u64) -> Result<Self::Handle, SpawnError> {
        if spec.id == self.refuse {
            return Err(SpawnError::Launch {
                task_id: spec.id,
                source: std::io::Error::other("no more threads"),
            });
        }
        self.inner.launch(spec, seed)
    }
}

#[tokio::test]
async fn test_spawn_failure_tears_down_launched_workers() {
    let config = WorkloadConfig::new(
        Duration::from_secs(5),
        vec![
            periodic(1, 0.01, 0.1),
            periodic(2, 0.01, 0.1),
            periodic(3, 0.01, 0.1),
        ],
    )
    .expect("config");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let launcher = RefusingLauncher {
        inner: ThreadLauncher::new(Burner::spin()).with_observer(Observer::with_collector(tx)),
        refuse: 3,
    };
    let mut orchestrator = Orchestrator::new(launcher, TokioTimeProvider::new(), quick_settings());

    let err = tokio::time::timeout(Duration::from_secs(2), orchestrator.run(&config))
        .await
        .expect("teardown does not wait for the global timer")
        .expect_err("spawn fails");
    assert!(matches!(err, SpawnError::Launch { task_id: 3, .. }));
    assert_eq!(orchestrator.worker_count(), 0);

    let observations: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    let mut stopped: Vec<_> = observations
        .iter()
        .filter(|o| matches!(o, Observation::TaskStopped { .. }))
        .map(Observation::task_id)
        .collect();
    stopped.sort_unstable();
    assert_eq!(stopped, vec![1, 2]);
    assert!(
        !observations
            .iter()
            .any(|o| matches!(o, Observation::JobStarted { .. })),
        "workers were never started"
    );
}

#[test]
fn test_invalid_spec_is_refused() {
    let launcher = ThreadLauncher::new(Burner::spin());
    let mut spec = periodic(1, 0.01, 0.1);
    spec.exec = rtsim::Bounds::new(0.5, 0.1);

    match launcher.launch(&spec, 0) {
        Err(SpawnError::InvalidSpec { task_id: 1, .. }) => {}
        Err(other) => panic!("unexpected {other}"),
        Ok(_) => panic!("launched an invalid task"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_premature_exit_is_reported_not_fatal() {
    let config = WorkloadConfig::new(
        Duration::from_secs(3),
        vec![
            periodic(1, 0.01, 0.1),
            periodic(2, 0.01, 0.1),
            periodic(3, 0.01, 0.1),
        ],
    )
    .expect("config");
    let launcher = ScriptedLauncher {
        crash: vec![2],
        refuse: None,
    };
    let mut orchestrator = Orchestrator::new(launcher, TokioTimeProvider::new(), quick_settings());

    let report = orchestrator.run(&config).await.expect("run completes");

    assert_eq!(report.spawned, 3);
    assert_eq!(report.reaped, 3);
    assert_eq!(report.premature_exits, vec![2]);
    assert_eq!(report.failed(), 1);
    assert!(report.outcomes[1].exited_early);
    assert!(!report.outcomes[0].exited_early);
    assert!(report.to_string().contains("=== Premature Exits ==="));
    // Measured on the paused runtime clock, so the whole duration shows.
    assert!(report.wall_time >= Duration::from_secs(3), "{:?}", report.wall_time);
}

#[tokio::test(start_paused = true)]
async fn test_scripted_spawn_failure_stops_earlier_workers() {
    let config = WorkloadConfig::new(
        Duration::from_secs(3),
        vec![periodic(1, 0.01, 0.1), periodic(2, 0.01, 0.1)],
    )
    .expect("config");
    let launcher = ScriptedLauncher {
        crash: vec![],
        refuse: Some(2),
    };
    let mut orchestrator = Orchestrator::new(launcher, TokioTimeProvider::new(), quick_settings());

    let err = orchestrator.run(&config).await.expect_err("spawn fails");
    assert!(matches!(err, SpawnError::Launch { task_id: 2, .. }));
    assert_eq!(orchestrator.worker_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_sequence_step_by_step() {
    let config = WorkloadConfig::new(
        Duration::from_secs(2),
        vec![periodic(1, 0.01, 0.1), periodic(2, 0.01, 0.1)],
    )
    .expect("config");
    let mut orchestrator = Orchestrator::new(
        ScriptedLauncher::default(),
        TokioTimeProvider::new(),
        quick_settings(),
    );

    orchestrator.arm_global_timer(config.duration());
    orchestrator.spawn_all(&config).await.expect("spawn");
    assert_eq!(orchestrator.worker_count(), 2);
    orchestrator.broadcast_start().await;
    orchestrator.await_completion().await;
    orchestrator.broadcast_stop().await;
    let outcomes = orchestrator.reap_all().await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.status.is_success()));
    assert_eq!(orchestrator.worker_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_ends_run_early() {
    let config =
        WorkloadConfig::new(Duration::from_secs(3600), vec![periodic(1, 0.01, 0.1)])
            .expect("config");
    let mut orchestrator = Orchestrator::new(
        ScriptedLauncher::default(),
        TokioTimeProvider::new(),
        quick_settings(),
    );
    orchestrator.shutdown_token().cancel();

    let report = orchestrator.run(&config).await.expect("run");

    assert!(report.interrupted);
    assert!(report.wall_time < Duration::from_secs(3600));
    assert!(report.all_succeeded());
}

#[tokio::test(start_paused = true)]
async fn test_await_completion_without_timer_returns() {
    let mut orchestrator = Orchestrator::new(
        ScriptedLauncher::default(),
        TokioTimeProvider::new(),
        quick_settings(),
    );
    orchestrator.await_completion().await;
    assert!(orchestrator.reap_all().await.is_empty());
}
