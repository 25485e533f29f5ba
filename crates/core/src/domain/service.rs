// Managed service configuration (immutable per invocation)

use super::error::{DomainError, Result};
use super::{ProcessSignature, WorkerSweep};
use crate::application::constants::{
    DEFAULT_READINESS_ATTEMPTS, DEFAULT_READINESS_INTERVAL, DEFAULT_STOP_GRACE,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How often and how long to poll the port after launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl ReadinessPolicy {
    /// Upper bound on the time spent waiting
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_READINESS_INTERVAL,
            attempts: DEFAULT_READINESS_ATTEMPTS,
        }
    }
}

/// Text substitution applied to a file before launch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePatch {
    /// Relative paths resolve against the working directory
    pub file: PathBuf,
    pub find: String,
    pub replace: String,
}

/// Launch mode for `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// New session, output to the log sink, wait for readiness
    Detached,
    /// Attached to the terminal, no readiness watch, no PID marker
    Foreground,
}

/// A locally managed long-running service (e.g. a web UI)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedService {
    pub name: String,
    pub port: u16,
    /// Host used when printing the URL
    pub host: String,
    pub install_dir: PathBuf,
    pub working_dir: PathBuf,
    /// Argument vector; first element is the executable
    pub command: Vec<String>,
    /// Identifies the service's own process on the port
    pub signature: ProcessSignature,
    /// Ancestors matching these are killed along with the port occupant
    pub supervisors: ProcessSignature,
    pub worker_sweep: Option<WorkerSweep>,
    pub readiness: ReadinessPolicy,
    /// Time between SIGTERM and SIGKILL on stop
    pub stop_grace: Duration,
    pub pid_marker: PathBuf,
    pub log_sink: PathBuf,
    pub patches: Vec<FilePatch>,
}

impl ManagedService {
    /// Create a service with default readiness, grace period and paths under
    /// the system temp dir. Working directory defaults to the install dir.
    pub fn new(
        name: impl Into<String>,
        port: u16,
        install_dir: impl Into<PathBuf>,
        command: Vec<String>,
    ) -> Self {
        let name = name.into();
        let install_dir = install_dir.into();
        let tmp = std::env::temp_dir();

        Self {
            pid_marker: tmp.join(format!("{}.pid", name)),
            log_sink: tmp.join(format!("{}.log", name)),
            working_dir: install_dir.clone(),
            name,
            port,
            host: "localhost".to_string(),
            install_dir,
            command,
            signature: ProcessSignature::default(),
            supervisors: ProcessSignature::default(),
            worker_sweep: None,
            readiness: ReadinessPolicy::default(),
            stop_grace: DEFAULT_STOP_GRACE,
            patches: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: ProcessSignature) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_supervisors(mut self, supervisors: ProcessSignature) -> Self {
        self.supervisors = supervisors;
        self
    }

    pub fn with_worker_sweep(mut self, sweep: WorkerSweep) -> Self {
        self.worker_sweep = Some(sweep);
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_readiness(mut self, readiness: ReadinessPolicy) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_pid_marker(mut self, path: impl Into<PathBuf>) -> Self {
        self.pid_marker = path.into();
        self
    }

    pub fn with_log_sink(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_sink = path.into();
        self
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn executable(&self) -> Option<&str> {
        self.command.first().map(|s| s.as_str())
    }

    /// Install directory as it appears on worker command lines
    pub fn install_dir_str(&self) -> String {
        self.install_dir.to_string_lossy().into_owned()
    }

    /// Resolve a patch target against the working directory
    pub fn patch_path(&self, patch: &FilePatch) -> PathBuf {
        resolve(&self.working_dir, &patch.file)
    }

    /// Reject configurations that can never produce a meaningful outcome
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::invalid(&self.name, "name is empty"));
        }
        if self.port == 0 {
            return Err(DomainError::invalid(&self.name, "port must be non-zero"));
        }
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            return Err(DomainError::invalid(&self.name, "launch command is empty"));
        }
        if self.signature.is_empty() {
            return Err(DomainError::invalid(
                &self.name,
                "identity signature has no patterns",
            ));
        }
        if self.readiness.attempts == 0 {
            return Err(DomainError::invalid(
                &self.name,
                "readiness attempts must be at least 1",
            ));
        }
        Ok(())
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ManagedService {
        ManagedService::new(
            "myservice",
            9000,
            "/opt/myservice",
            vec!["myservice".to_string(), "--port".to_string(), "9000".to_string()],
        )
        .with_signature(ProcessSignature::new().name("myservice"))
    }

    #[test]
    fn test_defaults() {
        let svc = service();

        assert_eq!(svc.working_dir, PathBuf::from("/opt/myservice"));
        assert_eq!(svc.readiness.attempts, 60);
        assert_eq!(svc.readiness.budget(), Duration::from_secs(60));
        assert_eq!(svc.url(), "http://localhost:9000");
        assert!(svc.pid_marker.ends_with("myservice.pid"));
        assert!(svc.log_sink.ends_with("myservice.log"));
        assert!(svc.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let mut svc = service();
        svc.port = 0;
        assert!(matches!(
            svc.validate(),
            Err(DomainError::InvalidService { .. })
        ));

        let mut svc = service();
        svc.command.clear();
        assert!(svc.validate().is_err());

        let svc = service().with_signature(ProcessSignature::new());
        assert!(svc.validate().is_err());

        let svc = service().with_readiness(ReadinessPolicy {
            interval: Duration::from_secs(1),
            attempts: 0,
        });
        assert!(svc.validate().is_err());
    }

    #[test]
    fn test_patch_path_resolves_relative_to_working_dir() {
        let svc = service().with_working_dir("/opt/myservice/ui");
        let patch = FilePatch {
            file: PathBuf::from("package.json"),
            find: "a".to_string(),
            replace: "b".to_string(),
        };

        assert_eq!(
            svc.patch_path(&patch),
            PathBuf::from("/opt/myservice/ui/package.json")
        );
    }
}
