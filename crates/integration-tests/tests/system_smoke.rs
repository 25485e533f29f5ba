//! Real-OS smoke tests (Linux only)
//!
//! Wires the controller to the system adapters and drives it against real
//! processes and sockets. Ports come from binding port 0, so these do not
//! collide with anything already listening.

#![cfg(target_os = "linux")]

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use warden_core::application::LifecycleController;
use warden_core::domain::{
    LifecycleOutcome, ManagedService, MarkerState, ProcessSignature, ReadinessPolicy,
    ServiceStatus, StartMode,
};
use warden_core::port::{PidMarkerStore, ProcessSignaller, ProcessTable, TokioSleeper};
use warden_infra_system::{
    DetachedSpawner, FilePidMarkerStore, ListenerPortProbe, NixSignaller, SysinfoProcessTable,
};

fn controller(table: Arc<SysinfoProcessTable>) -> LifecycleController {
    LifecycleController::new(
        Arc::new(ListenerPortProbe::new(table.clone())),
        table,
        Arc::new(DetachedSpawner),
        Arc::new(NixSignaller),
        Arc::new(FilePidMarkerStore),
        Arc::new(TokioSleeper),
    )
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("warden-smoke-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A port nobody is listening on (best effort)
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_status_sees_own_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let dir = scratch_dir();
    let table = Arc::new(SysinfoProcessTable::new());

    let ours = ManagedService::new("smoke", port, &dir, vec!["true".to_string()])
        // The test harness binary is named after this file
        .with_signature(ProcessSignature::new().cmdline("system_smoke"))
        .with_pid_marker(dir.join("smoke.pid"));
    let report = controller(table.clone()).status(&ours).unwrap();
    assert_eq!(report.status, ServiceStatus::Ready);
    assert_eq!(report.occupant.map(|p| p.pid), Some(std::process::id()));
    assert_eq!(report.marker, MarkerState::Absent);

    let theirs = ours
        .clone()
        .with_signature(ProcessSignature::new().name("definitely-not-this"));
    let report = controller(table).status(&theirs).unwrap();
    assert_eq!(report.status, ServiceStatus::Blocked);

    // Foreign occupant: start refuses without spawning
    let table = Arc::new(SysinfoProcessTable::new());
    let outcome = controller(table)
        .start(&theirs, StartMode::Detached)
        .await
        .unwrap();
    assert!(matches!(outcome, LifecycleOutcome::PortConflict(p) if p.pid == std::process::id()));
    assert!(!dir.join("smoke.pid").exists());

    drop(listener);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_detached_start_times_out_and_leaves_process() {
    let dir = scratch_dir();
    let marker = dir.join("sleeper.pid");
    let log = dir.join("sleeper.log");
    let table = Arc::new(SysinfoProcessTable::new());

    let service = ManagedService::new(
        "sleeper",
        free_port(),
        &dir,
        vec!["sleep".to_string(), "30".to_string()],
    )
    .with_signature(ProcessSignature::new().name("sleep"))
    .with_readiness(ReadinessPolicy {
        interval: Duration::from_millis(50),
        attempts: 4,
    })
    .with_pid_marker(&marker)
    .with_log_sink(&log);

    let outcome = controller(table.clone())
        .start(&service, StartMode::Detached)
        .await
        .unwrap();

    let LifecycleOutcome::Timeout { spawned, waited, .. } = outcome else {
        panic!("expected timeout, got {:?}", outcome);
    };
    assert_eq!(waited, Duration::from_millis(200));
    assert!(table.is_alive(spawned.pid));
    assert_eq!(FilePidMarkerStore.read(&marker).unwrap(), Some(spawned.pid));

    let header = std::fs::read_to_string(&log).unwrap();
    assert!(header.starts_with("=== sleeper started"));

    // Left running for diagnosis; clean up its session ourselves
    NixSignaller.kill_group(spawned.pid).unwrap();
    let mut gone = false;
    for _ in 0..50 {
        if !table.is_alive(spawned.pid) {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(gone, "spawned process should be gone after SIGKILL");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_stop_on_free_port_clears_marker() {
    let dir = scratch_dir();
    let marker = dir.join("idle.pid");
    FilePidMarkerStore.write(&marker, 4_000_000).unwrap();
    let table = Arc::new(SysinfoProcessTable::new());

    let service = ManagedService::new("idle", free_port(), &dir, vec!["true".to_string()])
        .with_signature(ProcessSignature::new().name("idle"))
        .with_pid_marker(&marker);

    let controller = controller(table);
    let status = controller.status(&service).unwrap();
    assert_eq!(status.status, ServiceStatus::Stopped);
    assert_eq!(status.marker, MarkerState::Stale(4_000_000));

    assert_eq!(
        controller.stop(&service).await.unwrap(),
        LifecycleOutcome::NotRunning
    );
    assert!(!marker.exists());
    // Second stop is a no-op
    assert_eq!(
        controller.stop(&service).await.unwrap(),
        LifecycleOutcome::NotRunning
    );

    std::fs::remove_dir_all(&dir).ok();
}
