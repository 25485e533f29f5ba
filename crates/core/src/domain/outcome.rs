// Lifecycle outcomes and reports (never persisted)

use super::{ManagedService, ProcessIdentity};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Who holds a service's port, relative to the service's signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupancy {
    Free,
    Own(ProcessIdentity),
    Foreign(ProcessIdentity),
}

impl Occupancy {
    pub fn classify(service: &ManagedService, occupant: Option<ProcessIdentity>) -> Self {
        match occupant {
            None => Occupancy::Free,
            Some(process) if service.signature.matches(&process) => Occupancy::Own(process),
            Some(process) => Occupancy::Foreign(process),
        }
    }
}

/// Result of a start or stop operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleOutcome {
    /// The service's own process bound the port
    Ready(ProcessIdentity),
    /// The service was already bound before start
    AlreadyRunning(ProcessIdentity),
    /// A foreign process holds the port
    PortConflict(ProcessIdentity),
    /// Spawned process never bound the port; left running for diagnosis
    Timeout {
        spawned: ProcessIdentity,
        waited: Duration,
        log_sink: PathBuf,
    },
    /// Nothing to stop
    NotRunning,
    Stopped(KillReport),
    /// Foreground run ended on its own
    Exited { code: Option<i32> },
    /// Foreground run interrupted by the operator (child left alone)
    Interrupted,
}

/// Classification reported by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ready,
    Blocked,
    Stopped,
}

/// PID marker state as observed against the live process table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "pid", rename_all = "lowercase")]
pub enum MarkerState {
    Absent,
    Live(u32),
    Stale(u32),
}

/// Pure-read snapshot produced by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub service: String,
    pub port: u16,
    pub url: String,
    pub status: ServiceStatus,
    pub occupant: Option<ProcessIdentity>,
    pub marker: MarkerState,
}

/// Why a process was selected for termination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessRole {
    /// The port occupant
    Target,
    /// Ancestor that would respawn the target
    Supervisor,
    /// Background worker found by the table sweep
    Worker,
}

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationKind {
    /// Exited after SIGTERM within the grace period
    Terminated,
    /// Needed SIGKILL
    Killed,
    /// Gone before we signalled it
    AlreadyExited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminatedProcess {
    pub identity: ProcessIdentity,
    pub role: ProcessRole,
    pub kind: TerminationKind,
}

/// A selected process that could not be signalled
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KillFailure {
    pub identity: ProcessIdentity,
    pub role: ProcessRole,
    pub reason: String,
}

/// Everything the tree killer terminated, outermost supervisor first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KillReport {
    pub processes: Vec<TerminatedProcess>,
    pub failed: Vec<KillFailure>,
}

impl KillReport {
    pub fn count(&self, role: ProcessRole) -> usize {
        self.processes.iter().filter(|p| p.role == role).count()
    }

    pub fn pids(&self) -> Vec<u32> {
        self.processes.iter().map(|p| p.identity.pid).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProcessSignature;

    #[test]
    fn test_occupancy_classification() {
        let service = ManagedService::new("svc", 9000, "/opt/svc", vec!["svc".to_string()])
            .with_signature(ProcessSignature::new().name("myservice"));

        assert_eq!(Occupancy::classify(&service, None), Occupancy::Free);

        let own = ProcessIdentity::new(4321, "myservice", vec![]);
        assert_eq!(
            Occupancy::classify(&service, Some(own.clone())),
            Occupancy::Own(own)
        );

        let foreign = ProcessIdentity::new(55, "otherapp", vec![]);
        assert_eq!(
            Occupancy::classify(&service, Some(foreign.clone())),
            Occupancy::Foreign(foreign)
        );
    }

    #[test]
    fn test_marker_state_serializes_tagged() {
        let json = serde_json::to_value(MarkerState::Stale(99)).unwrap();
        assert_eq!(json, serde_json::json!({"state": "stale", "pid": 99}));

        let json = serde_json::to_value(MarkerState::Absent).unwrap();
        assert_eq!(json, serde_json::json!({"state": "absent"}));
    }
}
