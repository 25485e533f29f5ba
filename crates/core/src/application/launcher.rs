// Process launcher: spawn + PID marker
use crate::domain::{ManagedService, ProcessIdentity};
use crate::error::Result;
use crate::port::{ForegroundExit, PidMarkerStore, ProcessSpawner};
use std::sync::Arc;
use tracing::{info, warn};

/// Launches a service and records the spawned pid in its PID marker
pub struct ProcessLauncher {
    spawner: Arc<dyn ProcessSpawner>,
    markers: Arc<dyn PidMarkerStore>,
}

impl ProcessLauncher {
    pub fn new(spawner: Arc<dyn ProcessSpawner>, markers: Arc<dyn PidMarkerStore>) -> Self {
        Self { spawner, markers }
    }

    /// Spawn detached and persist the pid
    ///
    /// # Errors
    /// - AppError::LaunchFailed if the working directory or executable is
    ///   missing, or the spawn itself fails
    pub async fn launch(&self, service: &ManagedService) -> Result<ProcessIdentity> {
        info!(
            service = %service.name,
            command = ?service.command,
            working_dir = %service.working_dir.display(),
            log_sink = %service.log_sink.display(),
            "Launching detached service"
        );

        let spawned = self.spawner.spawn_detached(service).await?;

        // The process is already running; a marker failure must not orphan it
        if let Err(e) = self.markers.write(&service.pid_marker, spawned.pid) {
            warn!(
                service = %service.name,
                pid = %spawned.pid,
                error = %e,
                "Failed to write PID marker"
            );
        }

        info!(service = %service.name, pid = %spawned.pid, "Service spawned");
        Ok(spawned)
    }

    /// Run attached to the terminal; no marker is written
    pub async fn run_foreground(&self, service: &ManagedService) -> Result<ForegroundExit> {
        info!(
            service = %service.name,
            command = ?service.command,
            "Running service in foreground"
        );
        Ok(self.spawner.run_foreground(service).await?)
    }
}
