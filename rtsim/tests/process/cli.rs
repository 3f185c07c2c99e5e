//! The `rtsim` command line.

use std::process::Command;

use super::{rtsim_binary, task_binary, workload_file};

#[test]
fn test_missing_config_exits_non_zero() {
    let dir = tempfile::tempdir().expect("temp dir");
    let output = Command::new(rtsim_binary())
        .arg(dir.path().join("absent.txt"))
        .output()
        .expect("run rtsim");
    assert!(!output.status.success());
}

#[test]
fn test_malformed_config_exits_non_zero() {
    let file = workload_file("3\n1\t0.1\n");
    let status = Command::new(rtsim_binary())
        .arg(file.path())
        .arg("--check")
        .status()
        .expect("run rtsim");
    assert!(!status.success());
}

#[test]
fn test_check_prints_workload() {
    let file = workload_file("7\n1\t0.1\t0.2\t1\t2\t1.5\t0\t0.5\n");
    let output = Command::new(rtsim_binary())
        .arg(file.path())
        .arg("--check")
        .output()
        .expect("run rtsim");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Workload ==="));
    assert!(stdout.contains("Duration: 7s"));
    assert!(stdout.contains("1\t0.100000\t0.200000"));
}

#[test]
fn test_unknown_backend_is_a_usage_error() {
    let file = workload_file("1\n");
    let status = Command::new(rtsim_binary())
        .arg(file.path())
        .args(["--backend", "fiber"])
        .status()
        .expect("run rtsim");
    assert_eq!(status.code(), Some(2));
}

#[test]
fn test_process_backend_end_to_end() {
    let file = workload_file(
        "1\n\
         1\t0.005\t0.01\t0.1\t0.1\t0.1\t0\t0\n\
         2\t0.005\t0.01\t0.1\t0.1\t0.1\t0\t0\n",
    );
    let output = Command::new(rtsim_binary())
        .arg(file.path())
        .arg("--task-binary")
        .arg(task_binary())
        .args(["--settle-ms", "20", "--burn", "spin", "--seed", "5"])
        .output()
        .expect("run rtsim");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("=== Run Report ==="), "{stderr}");
    assert!(stderr.contains("Tasks reaped: 2"), "{stderr}");
    assert!(stderr.trim_end().ends_with("all tasks finished"), "{stderr}");
}

#[test]
fn test_thread_backend_end_to_end() {
    let file = workload_file("1\n1\t0.005\t0.01\t0.1\t0.1\t0.1\t0\t0\n");
    let output = Command::new(rtsim_binary())
        .arg(file.path())
        .args(["--backend", "thread", "--settle-ms", "0", "--burn", "spin"])
        .output()
        .expect("run rtsim");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Tasks spawned: 1"));
}
