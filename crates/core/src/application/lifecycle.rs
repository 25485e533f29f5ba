// Lifecycle controller: start / stop / status
use crate::application::launcher::ProcessLauncher;
use crate::application::readiness::{Readiness, ReadinessWatcher};
use crate::application::tree_killer::SupervisorTreeKiller;
use crate::domain::{
    LifecycleOutcome, ManagedService, MarkerState, Occupancy, ServiceStatus, StartMode,
    StatusReport,
};
use crate::error::Result;
use crate::port::{
    ForegroundExit, PidMarkerStore, PortProbe, ProcessSignaller, ProcessSpawner, ProcessTable,
    Sleeper,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Orchestrates launcher, readiness watcher and tree killer.
///
/// The TCP port is the source of truth. The PID marker is advisory: it is
/// written on launch, reconciled against the live process table, and removed
/// on stop.
pub struct LifecycleController {
    probe: Arc<dyn PortProbe>,
    table: Arc<dyn ProcessTable>,
    signaller: Arc<dyn ProcessSignaller>,
    markers: Arc<dyn PidMarkerStore>,
    launcher: ProcessLauncher,
    watcher: ReadinessWatcher,
    killer: SupervisorTreeKiller,
}

impl LifecycleController {
    /// Wire a controller from its ports
    ///
    /// # Example
    /// ```ignore
    /// let controller = LifecycleController::new(
    ///     Arc::new(ListenerPortProbe::new(table.clone())),
    ///     table,
    ///     Arc::new(DetachedSpawner),
    ///     Arc::new(NixSignaller),
    ///     Arc::new(FilePidMarkerStore),
    ///     Arc::new(TokioSleeper),
    /// );
    /// ```
    pub fn new(
        probe: Arc<dyn PortProbe>,
        table: Arc<dyn ProcessTable>,
        spawner: Arc<dyn ProcessSpawner>,
        signaller: Arc<dyn ProcessSignaller>,
        markers: Arc<dyn PidMarkerStore>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            launcher: ProcessLauncher::new(spawner, markers.clone()),
            watcher: ReadinessWatcher::new(probe.clone(), sleeper.clone()),
            killer: SupervisorTreeKiller::new(table.clone(), signaller.clone(), sleeper),
            probe,
            table,
            signaller,
            markers,
        }
    }

    /// Replace the tree killer (tests pin its notion of "self")
    pub fn with_killer(mut self, killer: SupervisorTreeKiller) -> Self {
        self.killer = killer;
        self
    }

    /// Start the service unless its port is already held.
    ///
    /// - own signature on the port: `AlreadyRunning`, nothing spawned
    /// - foreign signature on the port: `PortConflict`, nothing spawned
    /// - otherwise launch, then wait for readiness (detached mode only)
    pub async fn start(
        &self,
        service: &ManagedService,
        mode: StartMode,
    ) -> Result<LifecycleOutcome> {
        service.validate()?;

        match Occupancy::classify(service, self.probe.occupant(service.port)?) {
            Occupancy::Own(process) => {
                info!(service = %service.name, pid = %process.pid, "Service already running");
                return Ok(LifecycleOutcome::AlreadyRunning(process));
            }
            Occupancy::Foreign(process) => {
                warn!(
                    service = %service.name,
                    port = %service.port,
                    occupant = %process,
                    cmdline = %process.command_line(),
                    "Port busy, refusing to launch"
                );
                return Ok(LifecycleOutcome::PortConflict(process));
            }
            Occupancy::Free => {}
        }

        if mode == StartMode::Foreground {
            return Ok(match self.launcher.run_foreground(service).await? {
                ForegroundExit::Exited(code) => LifecycleOutcome::Exited { code },
                ForegroundExit::Interrupted => LifecycleOutcome::Interrupted,
            });
        }

        match self.marker_state(service)? {
            MarkerState::Stale(pid) => {
                debug!(service = %service.name, pid = %pid, "Discarding stale PID marker");
                self.markers.remove(&service.pid_marker)?;
            }
            MarkerState::Live(pid) => {
                warn!(
                    service = %service.name,
                    pid = %pid,
                    "Previous launch still alive but port is free; launching anyway"
                );
            }
            MarkerState::Absent => {}
        }

        let spawned = self.launcher.launch(service).await?;

        match self.watcher.watch(service, Some(&spawned)).await? {
            Readiness::Ready(process) => Ok(LifecycleOutcome::Ready(process)),
            Readiness::PortConflict(occupant) => {
                // Our spawn lost the race; do not leave it behind
                if let Err(e) = self.signaller.kill_group(spawned.pid) {
                    warn!(pid = %spawned.pid, error = %e, "Failed to kill spawned process group");
                }
                self.markers.remove(&service.pid_marker)?;
                Ok(LifecycleOutcome::PortConflict(occupant))
            }
            Readiness::Timeout { waited, .. } => Ok(LifecycleOutcome::Timeout {
                spawned,
                waited,
                log_sink: service.log_sink.clone(),
            }),
        }
    }

    /// Stop whatever holds the service's port, with its supervisor chain.
    ///
    /// Idempotent: with nothing on the port, any marker is removed and
    /// `NotRunning` is returned.
    pub async fn stop(&self, service: &ManagedService) -> Result<LifecycleOutcome> {
        let Some(target) = self.probe.occupant(service.port)? else {
            if self.markers.remove(&service.pid_marker)? {
                info!(service = %service.name, "Removed leftover PID marker");
            }
            info!(service = %service.name, port = %service.port, "No process found on port");
            return Ok(LifecycleOutcome::NotRunning);
        };

        if !service.signature.matches(&target) {
            warn!(
                service = %service.name,
                occupant = %target,
                "Port occupant does not match the service signature; stopping it anyway"
            );
        }

        info!(service = %service.name, target = %target, "Stopping service");
        let report = self.killer.kill_tree(service, &target).await;

        self.markers.remove(&service.pid_marker)?;
        Ok(LifecycleOutcome::Stopped(report))
    }

    /// Classify the port occupant. Pure read: a stale marker is reported, not removed.
    pub fn status(&self, service: &ManagedService) -> Result<StatusReport> {
        let (status, occupant) =
            match Occupancy::classify(service, self.probe.occupant(service.port)?) {
                Occupancy::Own(p) => (ServiceStatus::Ready, Some(p)),
                Occupancy::Foreign(p) => (ServiceStatus::Blocked, Some(p)),
                Occupancy::Free => (ServiceStatus::Stopped, None),
            };

        Ok(StatusReport {
            service: service.name.clone(),
            port: service.port,
            url: service.url(),
            status,
            occupant,
            marker: self.marker_state(service)?,
        })
    }

    /// Reconcile the PID marker against the live process table
    pub fn marker_state(&self, service: &ManagedService) -> Result<MarkerState> {
        Ok(match self.markers.read(&service.pid_marker)? {
            None => MarkerState::Absent,
            Some(pid) if self.table.is_alive(pid) => MarkerState::Live(pid),
            Some(pid) => MarkerState::Stale(pid),
        })
    }
}
