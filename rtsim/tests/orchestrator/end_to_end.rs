//! Full runs over thread-backed workers.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rtsim::{
    Burner, Observation, Observer, Orchestrator, TaskId, ThreadLauncher, TokioTimeProvider,
    WorkloadConfig,
};
use tokio::sync::mpsc;

use super::{periodic, quick_settings};

fn finished_jobs(observations: &[Observation]) -> BTreeMap<TaskId, Vec<u64>> {
    let mut jobs: BTreeMap<TaskId, Vec<u64>> = BTreeMap::new();
    for observation in observations {
        if let Observation::JobFinished {
            task_id, job_id, ..
        } = observation
        {
            jobs.entry(*task_id).or_default().push(*job_id);
        }
    }
    jobs
}

#[tokio::test]
async fn test_single_task_runs_until_global_cutoff() {
    let config =
        WorkloadConfig::new(Duration::from_secs(1), vec![periodic(1, 0.01, 0.1)]).expect("config");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let launcher = ThreadLauncher::new(Burner::spin()).with_observer(Observer::with_collector(tx));
    let mut orchestrator = Orchestrator::new(launcher, TokioTimeProvider::new(), quick_settings());

    let started = Instant::now();
    let report = orchestrator.run(&config).await.expect("run");
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    assert_eq!(report.spawned, 1);
    assert_eq!(report.reaped, 1);
    assert!(report.all_succeeded());
    assert!(report.premature_exits.is_empty());
    assert!(!report.interrupted);
    assert!(report.to_string().ends_with("all tasks finished"));
    assert_eq!(orchestrator.worker_count(), 0);

    let observations: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    let jobs = finished_jobs(&observations);
    let task_jobs = jobs.get(&1).expect("jobs ran");
    assert!(task_jobs.len() >= 3, "only {} jobs", task_jobs.len());
    assert!(task_jobs.len() <= 12, "{} jobs in one second", task_jobs.len());
    assert!(matches!(
        observations.last(),
        Some(Observation::TaskStopped { task_id: 1, .. })
    ));
}

#[tokio::test]
async fn test_identical_tasks_run_independently() {
    let config = WorkloadConfig::new(
        Duration::from_secs(1),
        vec![periodic(1, 0.005, 0.05), periodic(2, 0.005, 0.05)],
    )
    .expect("config");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let launcher = ThreadLauncher::new(Burner::spin()).with_observer(Observer::with_collector(tx));
    let mut orchestrator = Orchestrator::new(launcher, TokioTimeProvider::new(), quick_settings());

    let report = orchestrator.run(&config).await.expect("run");
    assert_eq!(report.spawned, 2);
    assert!(report.all_succeeded());

    let observations: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    let jobs = finished_jobs(&observations);
    for task_id in [1, 2] {
        let sequence = jobs.get(&task_id).expect("jobs ran");
        assert!(sequence.len() >= 5, "task {task_id}: {} jobs", sequence.len());
        assert_eq!(sequence[0], 1);
        for pair in sequence.windows(2) {
            assert_eq!(pair[1], pair[0] + 1, "task {task_id}");
        }
    }

    let stopped: Vec<_> = observations
        .iter()
        .filter(|o| matches!(o, Observation::TaskStopped { .. }))
        .map(Observation::task_id)
        .collect();
    assert_eq!(stopped.len(), 2);
}
