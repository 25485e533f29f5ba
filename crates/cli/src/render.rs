// Terminal output for lifecycle outcomes

use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use warden_core::domain::{
    KillReport, LifecycleOutcome, ManagedService, MarkerState, ProcessIdentity, ProcessRole,
    ServiceStatus, StartMode, StatusReport, TerminationKind,
};

pub const EXIT_OK: u8 = 0;
pub const EXIT_CONFLICT: u8 = 1;
pub const EXIT_FAILED: u8 = 2;
pub const EXIT_TIMEOUT: u8 = 3;

pub fn launch_banner(service: &ManagedService, mode: StartMode) {
    println!("{}", format!("🚀 Launching {}", service.name).cyan().bold());
    println!("  {} {}", "Path:".bold(), service.working_dir.display());
    println!("  {} {}", "Port:".bold(), service.port);
    match mode {
        StartMode::Detached => {
            println!("  {} {}", "Logs:".bold(), service.log_sink.display());
            println!();
            println!(
                "{}",
                format!(
                    "⏳ Waiting for port {} (up to {}s)...",
                    service.port,
                    service.readiness.budget().as_secs()
                )
                .dimmed()
            );
        }
        StartMode::Foreground => {
            println!("  {} attached, Ctrl+C to stop", "Mode:".bold());
            println!();
        }
    }
}

fn describe(process: &ProcessIdentity) {
    println!("  {} {}", "Process:".bold(), process);
    let command_line = process.command_line();
    if !command_line.is_empty() {
        println!("  {} {}", "Command:".bold(), command_line);
    }
}

/// Print a start outcome and return the exit code it maps to
pub fn start_outcome(service: &ManagedService, outcome: &LifecycleOutcome) -> u8 {
    match outcome {
        LifecycleOutcome::Ready(process) => {
            println!("{}", format!("✓ {} is ready", service.name).green().bold());
            println!("  {} {}", "Dashboard:".bold(), service.url());
            println!("  {} {}", "PID:".bold(), process.pid);
            EXIT_OK
        }
        LifecycleOutcome::AlreadyRunning(process) => {
            println!(
                "{}",
                format!("⚠ {} is already running", service.name).yellow().bold()
            );
            describe(process);
            println!("  {} {}", "Dashboard:".bold(), service.url());
            EXIT_OK
        }
        LifecycleOutcome::PortConflict(process) => {
            println!("{}", format!("✗ Port {} is busy", service.port).red().bold());
            describe(process);
            println!();
            println!("Stop it first, or run `warden stop` for the service that owns it.");
            EXIT_CONFLICT
        }
        LifecycleOutcome::Timeout {
            spawned,
            waited,
            log_sink,
        } => {
            println!(
                "{}",
                format!(
                    "⚠ {} did not bind port {} within {}s",
                    service.name,
                    service.port,
                    waited.as_secs()
                )
                .yellow()
                .bold()
            );
            println!("  {} {} (left running)", "PID:".bold(), spawned.pid);
            println!("  {} {}", "Check logs:".bold(), log_sink.display());
            EXIT_TIMEOUT
        }
        LifecycleOutcome::Exited { code } => match code {
            Some(0) => EXIT_OK,
            Some(code) => {
                println!("{}", format!("✗ {} exited with code {}", service.name, code).red());
                u8::try_from(*code).unwrap_or(EXIT_FAILED)
            }
            None => {
                println!("{}", format!("✗ {} was terminated by a signal", service.name).red());
                EXIT_FAILED
            }
        },
        LifecycleOutcome::Interrupted => {
            println!();
            println!("{}", "Interrupted, stopping...".yellow());
            EXIT_OK
        }
        LifecycleOutcome::NotRunning | LifecycleOutcome::Stopped(_) => EXIT_OK,
    }
}

pub fn stop_outcome(service: &ManagedService, outcome: &LifecycleOutcome) {
    match outcome {
        LifecycleOutcome::Stopped(report) => {
            if let Some(target) = report
                .processes
                .iter()
                .find(|p| p.role == ProcessRole::Target)
            {
                println!("🛑 Found process: {}", target.identity);
            }
            if !report.processes.is_empty() {
                println!("{}", kill_table(report));
            }
            for failure in &report.failed {
                println!(
                    "  {} could not stop {}: {}",
                    "✗".red(),
                    failure.identity,
                    failure.reason
                );
            }
            println!("{}", format!("✓ {} stopped", service.name).green().bold());
        }
        _ => {
            println!(
                "{}",
                format!("No process found on port {}.", service.port).yellow()
            );
        }
    }
}

#[derive(Tabled)]
struct KillRow {
    pid: u32,
    name: String,
    role: &'static str,
    result: &'static str,
}

fn role_label(role: ProcessRole) -> &'static str {
    match role {
        ProcessRole::Target => "target",
        ProcessRole::Supervisor => "supervisor",
        ProcessRole::Worker => "worker",
    }
}

/// Outermost supervisor first, the order signals were sent in
pub fn kill_table(report: &KillReport) -> String {
    let rows: Vec<KillRow> = report
        .processes
        .iter()
        .map(|p| KillRow {
            pid: p.identity.pid,
            name: p.identity.name.clone(),
            role: role_label(p.role),
            result: match p.kind {
                TerminationKind::Terminated => "terminated",
                TerminationKind::Killed => "killed",
                TerminationKind::AlreadyExited => "already exited",
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn status(report: &StatusReport) {
    println!("{}", report.service.cyan().bold());
    println!();
    println!("  {} {}", "URL:".bold(), report.url);

    let status = match report.status {
        ServiceStatus::Ready => "READY".green(),
        ServiceStatus::Blocked => "BLOCKED".red(),
        ServiceStatus::Stopped => "STOPPED".yellow(),
    };
    println!("  {} {}", "Status:".bold(), status);

    if let Some(process) = &report.occupant {
        describe(process);
    }

    let marker = match report.marker {
        MarkerState::Absent => "none".dimmed().to_string(),
        MarkerState::Live(pid) => format!("{} (live)", pid),
        MarkerState::Stale(pid) => format!("{} (stale)", pid).yellow().to_string(),
    };
    println!("  {} {}", "PID file:".bold(), marker);
}

#[derive(Tabled)]
struct ServiceRow {
    name: String,
    port: u16,
    url: String,
    directory: String,
}

pub fn service_table(services: &[ManagedService]) -> String {
    let rows: Vec<ServiceRow> = services
        .iter()
        .map(|s| ServiceRow {
            name: s.name.clone(),
            port: s.port,
            url: s.url(),
            directory: s.working_dir.display().to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use warden_core::domain::TerminatedProcess;

    fn service() -> ManagedService {
        ManagedService::new("svc", 9000, "/opt/svc", vec!["run".to_string()])
    }

    #[test]
    fn test_exit_codes() {
        let svc = service();
        let process = ProcessIdentity::new(10, "run", vec![]);

        assert_eq!(start_outcome(&svc, &LifecycleOutcome::Ready(process.clone())), EXIT_OK);
        assert_eq!(
            start_outcome(&svc, &LifecycleOutcome::AlreadyRunning(process.clone())),
            EXIT_OK
        );
        assert_eq!(
            start_outcome(&svc, &LifecycleOutcome::PortConflict(process.clone())),
            EXIT_CONFLICT
        );
        assert_eq!(
            start_outcome(
                &svc,
                &LifecycleOutcome::Timeout {
                    spawned: process,
                    waited: Duration::from_secs(60),
                    log_sink: PathBuf::from("/tmp/svc.log"),
                }
            ),
            EXIT_TIMEOUT
        );
        assert_eq!(start_outcome(&svc, &LifecycleOutcome::Exited { code: Some(7) }), 7);
        assert_eq!(
            start_outcome(&svc, &LifecycleOutcome::Exited { code: None }),
            EXIT_FAILED
        );
        assert_eq!(start_outcome(&svc, &LifecycleOutcome::Interrupted), EXIT_OK);
    }

    #[test]
    fn test_kill_table_lists_every_process() {
        let report = KillReport {
            processes: vec![
                TerminatedProcess {
                    identity: ProcessIdentity::new(11, "npm", vec![]),
                    role: ProcessRole::Supervisor,
                    kind: TerminationKind::Terminated,
                },
                TerminatedProcess {
                    identity: ProcessIdentity::new(12, "node", vec![]),
                    role: ProcessRole::Target,
                    kind: TerminationKind::Killed,
                },
            ],
            failed: vec![],
        };

        let table = kill_table(&report);
        assert!(table.contains("npm"));
        assert!(table.contains("supervisor"));
        assert!(table.contains("killed"));
        assert!(table.find("11").unwrap() < table.find("12").unwrap());
    }
}
