//! Jobs that outlive their inter-arrival time.

use std::collections::HashSet;
use std::time::Duration;

use rtsim::{Bounds, Notification, Observation, TaskSpec, WorkerHandle, WorkerLauncher};

use super::{observed_launcher, periodic, wait_for};

#[tokio::test]
async fn test_overrun_preempts_running_job() {
    let (launcher, mut rx) = observed_launcher();
    let mut worker = launcher
        .launch(&periodic(7, 0.2, 0.02, 0.0), 2)
        .expect("launch");

    worker.notify(Notification::Start).await.expect("start");
    let preempted = wait_for(&mut rx, Duration::from_secs(2), |o| {
        matches!(o, Observation::JobPreempted { .. })
    })
    .await
    .expect("overrun reported");

    match preempted {
        Observation::JobPreempted {
            task_id,
            job_id,
            elapsed,
            requested,
        } => {
            assert_eq!(task_id, 7);
            assert_eq!(job_id, 1);
            assert_eq!(requested, Duration::from_millis(200));
            assert!(elapsed < requested);
        }
        other => panic!("unexpected {other:?}"),
    }

    let next = wait_for(&mut rx, Duration::from_secs(1), |o| {
        matches!(o, Observation::JobStarted { .. })
    })
    .await
    .expect("next job released");
    assert!(matches!(next, Observation::JobStarted { job_id: 2, .. }));

    worker.notify(Notification::Stop).await.expect("stop");
    assert!(worker.wait().await.is_success());
    let exit = worker.exit().expect("clean exit");
    assert!(exit.jobs_preempted >= 1);
}

#[tokio::test]
async fn test_suspended_job_finishes_after_newer_job() {
    let (launcher, mut rx) = observed_launcher();
    // Mean execution time is below the period, but many jobs overrun.
    let spec = TaskSpec {
        exec: Bounds::new(0.005, 0.08),
        ..periodic(9, 0.0, 0.05, 0.0)
    };
    let mut worker = launcher.launch(&spec, 17).expect("launch");

    worker.notify(Notification::Start).await.expect("start");
    let resumed = tokio::time::timeout(Duration::from_secs(10), async {
        let mut suspended = HashSet::new();
        while let Some(observation) = rx.recv().await {
            match observation {
                Observation::JobPreempted { job_id, .. } => {
                    suspended.insert(job_id);
                }
                Observation::JobFinished {
                    job_id,
                    elapsed,
                    requested,
                    ..
                } if suspended.contains(&job_id) => return Some((elapsed, requested)),
                _ => {}
            }
        }
        None
    })
    .await
    .ok()
    .flatten();

    worker.notify(Notification::Stop).await.expect("stop");
    assert!(worker.wait().await.is_success());

    let (elapsed, requested) = resumed.expect("a suspended job resumed and finished");
    // Wall-clock time covers the burn plus the time spent suspended.
    assert!(elapsed >= requested, "{elapsed:?} < {requested:?}");
    let exit = worker.exit().expect("clean exit");
    assert!(exit.jobs_preempted >= 1);
    assert!(exit.jobs_completed >= 1);
}

#[tokio::test]
async fn test_stop_interrupts_long_burn() {
    let (launcher, mut rx) = observed_launcher();
    let mut worker = launcher
        .launch(&periodic(8, 30.0, 60.0, 0.0), 2)
        .expect("launch");

    worker.notify(Notification::Start).await.expect("start");
    wait_for(&mut rx, Duration::from_secs(2), |o| {
        matches!(o, Observation::JobStarted { .. })
    })
    .await
    .expect("job started");

    worker.notify(Notification::Stop).await.expect("stop");
    let status = tokio::time::timeout(Duration::from_secs(2), worker.wait())
        .await
        .expect("stopped mid-burn");
    assert!(status.is_success());
}
