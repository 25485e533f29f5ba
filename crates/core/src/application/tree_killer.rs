// Supervisor tree killer: stop a port occupant and the wrappers that would respawn it
use crate::application::constants::TERMINATION_POLL_INTERVAL;
use crate::domain::{
    KillFailure, KillReport, ManagedService, ProcessIdentity, ProcessRole, ProcessSignature,
    TerminatedProcess, TerminationKind,
};
use crate::port::{ProcessSignaller, ProcessTable, SignalDelivery, Sleeper};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Kills a target process plus its chain of supervisor ancestors.
///
/// Supervisors (npm, shell wrappers, `concurrently`, ...) watch their child and
/// relaunch it, so killing only the port occupant is not enough. The walk goes
/// up the parent chain while ancestors match the service's supervisor
/// signature and stops at the first one that does not. Init, this process and
/// this process's own ancestors are never selected.
pub struct SupervisorTreeKiller {
    table: Arc<dyn ProcessTable>,
    signaller: Arc<dyn ProcessSignaller>,
    sleeper: Arc<dyn Sleeper>,
    poll_interval: Duration,
    self_pid: u32,
}

impl SupervisorTreeKiller {
    pub fn new(
        table: Arc<dyn ProcessTable>,
        signaller: Arc<dyn ProcessSignaller>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            table,
            signaller,
            sleeper,
            poll_interval: TERMINATION_POLL_INTERVAL,
            self_pid: std::process::id(),
        }
    }

    /// Override the pid treated as "ourselves" (tests with synthetic tables)
    pub fn with_self_pid(mut self, pid: u32) -> Self {
        self.self_pid = pid;
        self
    }

    /// Target followed by each matching ancestor, innermost first
    pub fn collect_chain(
        &self,
        target: &ProcessIdentity,
        supervisors: &ProcessSignature,
    ) -> Vec<ProcessIdentity> {
        let protected = self.protected_pids();
        let target = self.table.process(target.pid).unwrap_or_else(|| target.clone());

        let mut visited = HashSet::from([target.pid]);
        let mut next = target.parent_pid;
        let mut chain = vec![target];

        while let Some(ppid) = next {
            if protected.contains(&ppid) || !visited.insert(ppid) {
                break;
            }
            // Parent exited since we looked: the chain ends here
            let Some(parent) = self.table.process(ppid) else {
                break;
            };
            if !supervisors.matches(&parent) {
                debug!(pid = %parent.pid, name = %parent.name, "Ancestor is not a supervisor");
                break;
            }

            info!(pid = %parent.pid, name = %parent.name, "Found supervisor");
            next = parent.parent_pid;
            chain.push(parent);
        }

        chain
    }

    /// Background workers of the service not already selected
    pub fn collect_workers(
        &self,
        service: &ManagedService,
        exclude: &HashSet<u32>,
    ) -> Vec<ProcessIdentity> {
        let Some(sweep) = &service.worker_sweep else {
            return Vec::new();
        };
        let install_dir = service.install_dir_str();
        let protected = self.protected_pids();

        self.table
            .processes()
            .into_iter()
            .filter(|p| !exclude.contains(&p.pid) && !protected.contains(&p.pid))
            .filter(|p| sweep.matches(p, &install_dir))
            .collect()
    }

    /// Terminate target, supervisors (outermost first) and swept workers.
    ///
    /// Each gets SIGTERM; whatever is still alive after `service.stop_grace`
    /// gets SIGKILL. Processes that vanish along the way count as stopped.
    pub async fn kill_tree(
        &self,
        service: &ManagedService,
        target: &ProcessIdentity,
    ) -> KillReport {
        let chain = self.collect_chain(target, &service.supervisors);
        let selected_pids: HashSet<u32> = chain.iter().map(|p| p.pid).collect();

        // Outermost supervisor first so nothing is left to respawn the target
        let mut selected: Vec<(ProcessIdentity, ProcessRole)> = chain
            .into_iter()
            .enumerate()
            .map(|(depth, p)| {
                let role = if depth == 0 {
                    ProcessRole::Target
                } else {
                    ProcessRole::Supervisor
                };
                (p, role)
            })
            .collect();
        selected.reverse();

        for worker in self.collect_workers(service, &selected_pids) {
            info!(pid = %worker.pid, cmdline = %worker.command_line(), "Cleaning backend worker");
            selected.push((worker, ProcessRole::Worker));
        }

        self.terminate_all(selected, service.stop_grace).await
    }

    async fn terminate_all(
        &self,
        selected: Vec<(ProcessIdentity, ProcessRole)>,
        grace: Duration,
    ) -> KillReport {
        let order: Vec<u32> = selected.iter().map(|(p, _)| p.pid).collect();
        let mut report = KillReport::default();
        let mut pending = Vec::new();

        for (identity, role) in selected {
            match self.signaller.terminate(identity.pid) {
                Ok(SignalDelivery::Delivered) => {
                    info!(pid = %identity.pid, name = %identity.name, ?role, "Sent SIGTERM");
                    pending.push((identity, role));
                }
                Ok(SignalDelivery::AlreadyExited) => {
                    debug!(pid = %identity.pid, "Process already exited");
                    report.processes.push(TerminatedProcess {
                        identity,
                        role,
                        kind: TerminationKind::AlreadyExited,
                    });
                }
                Err(e) => {
                    warn!(pid = %identity.pid, error = %e, "Failed to send SIGTERM");
                    report.failed.push(KillFailure {
                        identity,
                        role,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut elapsed = Duration::ZERO;
        loop {
            let (gone, alive): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|(p, _): &(ProcessIdentity, ProcessRole)| !self.table.is_alive(p.pid));
            for (identity, role) in gone {
                report.processes.push(TerminatedProcess {
                    identity,
                    role,
                    kind: TerminationKind::Terminated,
                });
            }
            pending = alive;

            if pending.is_empty() || elapsed >= grace {
                break;
            }
            self.sleeper.sleep(self.poll_interval).await;
            elapsed += self.poll_interval;
        }

        for (identity, role) in pending {
            warn!(pid = %identity.pid, "Process did not exit after SIGTERM, sending SIGKILL");
            match self.signaller.kill(identity.pid) {
                Ok(delivery) => {
                    let kind = match delivery {
                        SignalDelivery::Delivered => TerminationKind::Killed,
                        SignalDelivery::AlreadyExited => TerminationKind::Terminated,
                    };
                    report.processes.push(TerminatedProcess {
                        identity,
                        role,
                        kind,
                    });
                }
                Err(e) => {
                    warn!(pid = %identity.pid, error = %e, "Failed to send SIGKILL");
                    report.failed.push(KillFailure {
                        identity,
                        role,
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
            .processes
            .sort_by_key(|p| order.iter().position(|pid| *pid == p.identity.pid));
        report
    }

    /// Pids that must never be signalled: init, ourselves and our ancestors
    fn protected_pids(&self) -> HashSet<u32> {
        let mut protected = HashSet::from([0, 1, self.self_pid]);
        let mut next = self.table.process(self.self_pid).and_then(|p| p.parent_pid);

        while let Some(pid) = next {
            if !protected.insert(pid) {
                break;
            }
            next = self.table.process(pid).and_then(|p| p.parent_pid);
        }
        protected
    }
}
