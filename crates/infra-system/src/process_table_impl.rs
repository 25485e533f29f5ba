// Process table implementation
// reason: sysinfo for process enumeration (names, command lines, parents)
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid as NixPid;
use std::sync::{Mutex, MutexGuard};
use sysinfo::{Pid, Process, ProcessStatus, System};
use tracing::debug;

use warden_core::domain::ProcessIdentity;
use warden_core::port::ProcessTable;

/// Process table backed by sysinfo
///
/// Every query refreshes the relevant entries first; nothing is served from a
/// previous refresh.
pub struct SysinfoProcessTable {
    system: Mutex<System>,
}

impl SysinfoProcessTable {
    /// Create a new process table
    ///
    /// # Example
    /// ```ignore
    /// let table = SysinfoProcessTable::new();
    /// let me = table.process(std::process::id());
    /// ```
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        // A panic mid-refresh leaves stale data at worst; the next refresh fixes it
        self.system.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn identity(pid: Pid, process: &Process) -> ProcessIdentity {
        ProcessIdentity {
            pid: pid.as_u32(),
            name: process.name().to_string(),
            cmdline: process.cmd().to_vec(),
            parent_pid: process.parent().map(|p| p.as_u32()),
        }
    }
}

impl Default for SysinfoProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SysinfoProcessTable {
    fn process(&self, pid: u32) -> Option<ProcessIdentity> {
        let mut sys = self.system();
        let pid = Pid::from_u32(pid);

        if !sys.refresh_process(pid) {
            debug!(pid = %pid, "Process not found");
            return None;
        }
        sys.process(pid).map(|p| Self::identity(pid, p))
    }

    fn processes(&self) -> Vec<ProcessIdentity> {
        let mut sys = self.system();
        sys.refresh_processes();

        let mut all: Vec<ProcessIdentity> = sys
            .processes()
            .iter()
            .map(|(pid, p)| Self::identity(*pid, p))
            .collect();
        all.sort_by_key(|p| p.pid);
        all
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };

        // Signal 0 checks existence; EPERM means it exists but is not ours
        match kill(NixPid::from_raw(raw), None) {
            Ok(()) | Err(Errno::EPERM) => {}
            Err(_) => return false,
        }

        let mut sys = self.system();
        let pid = Pid::from_u32(pid);
        if !sys.refresh_process(pid) {
            return false;
        }
        sys.process(pid)
            .map(|p| p.status() != ProcessStatus::Zombie)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_current_process() {
        let table = SysinfoProcessTable::new();
        let me = table.process(std::process::id()).unwrap();

        assert_eq!(me.pid, std::process::id());
        assert!(!me.name.is_empty());
        assert!(me.parent_pid.is_some());
        assert!(table.is_alive(me.pid));
    }

    #[test]
    fn test_processes_contains_current_process() {
        let table = SysinfoProcessTable::new();
        let all = table.processes();

        assert!(all.iter().any(|p| p.pid == std::process::id()));
    }

    #[test]
    fn test_reaped_process_is_not_alive() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();

        let table = SysinfoProcessTable::new();
        assert!(!table.is_alive(pid));
    }

    #[test]
    fn test_zombie_is_not_alive() {
        let child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        // Not waited on: becomes a zombie once it exits
        std::thread::sleep(std::time::Duration::from_millis(300));

        let table = SysinfoProcessTable::new();
        assert!(!table.is_alive(pid));
        drop(child);
    }
}
