//! `rtsim-task` driven over its stdin protocol.

use std::time::Duration;

use rtsim::{
    Bounds, BurnStrategy, Notification, ProcessLauncher, TaskSpec, WorkerHandle, WorkerLauncher,
    WorkerStatus,
};

use super::task_binary;

fn spec(id: u32) -> TaskSpec {
    TaskSpec {
        id,
        exec: Bounds::new(0.005, 0.01),
        inter_arrival: Bounds::new(0.05, 0.1),
        deadline: 0.1,
        offset: Bounds::new(0.0, 0.02),
    }
}

fn launcher() -> ProcessLauncher {
    ProcessLauncher::new(task_binary()).with_burn(BurnStrategy::Spin)
}

#[tokio::test]
async fn test_start_then_stop_exits_cleanly() {
    let mut worker = launcher().launch(&spec(1), 17).expect("launch");
    assert_eq!(worker.task_id(), 1);

    worker.notify(Notification::Start).await.expect("start");
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!worker.has_exited());

    worker.notify(Notification::Stop).await.expect("stop");
    let status = tokio::time::timeout(Duration::from_secs(5), worker.wait())
        .await
        .expect("worker exits after stop");
    assert_eq!(status, WorkerStatus::Success);
    assert!(worker.has_exited());
}

#[tokio::test]
async fn test_closed_stdin_acts_as_stop() {
    let mut worker = launcher()
        .with_deadline_miss_reports(true)
        .launch(&spec(2), 3)
        .expect("launch");

    worker.notify(Notification::Start).await.expect("start");
    tokio::time::sleep(Duration::from_millis(100)).await;

    // wait() closes stdin without sending a stop line.
    let status = tokio::time::timeout(Duration::from_secs(5), worker.wait())
        .await
        .expect("worker exits on end of input");
    assert!(status.is_success());
}

#[tokio::test]
async fn test_notify_after_stop_is_rejected() {
    let mut worker = launcher().launch(&spec(3), 3).expect("launch");
    worker.notify(Notification::Stop).await.expect("stop");
    assert!(worker.notify(Notification::Start).await.is_err());
    assert!(worker.wait().await.is_success());
}

#[tokio::test]
async fn test_missing_executable_fails_to_launch() {
    let launcher = ProcessLauncher::new("/nonexistent/rtsim-task");
    match launcher.launch(&spec(4), 0) {
        Err(rtsim::SpawnError::Launch { task_id: 4, .. }) => {}
        other => panic!("expected a launch failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_arguments_exit_with_failure() {
    let mut child = tokio::process::Command::new(task_binary())
        .args(["1", "0.5", "0.1", "1", "1", "1", "0", "0", "7"])
        .stdin(std::process::Stdio::null())
        .spawn()
        .expect("spawn");
    let status = child.wait().await.expect("wait");
    assert!(!status.success());
}
