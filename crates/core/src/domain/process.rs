// Process identity snapshot

use serde::Serialize;
use std::fmt;

/// Read-only snapshot of a live process, taken at query time.
///
/// PIDs are recycled by the OS, so an identity is only meaningful for the
/// operation that produced it. Never keep one across operations; re-resolve
/// through the process table instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessIdentity {
    pub pid: u32,
    /// Executable name as reported by the OS (may be truncated)
    pub name: String,
    /// Full argument vector
    pub cmdline: Vec<String>,
    /// Parent pid, if known. Resolve the parent itself lazily via the process table.
    pub parent_pid: Option<u32>,
}

impl ProcessIdentity {
    pub fn new(pid: u32, name: impl Into<String>, cmdline: Vec<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            cmdline,
            parent_pid: None,
        }
    }

    pub fn with_parent(mut self, parent_pid: u32) -> Self {
        self.parent_pid = Some(parent_pid);
        self
    }

    /// Command line joined with single spaces
    pub fn command_line(&self) -> String {
        self.cmdline.join(" ")
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (PID: {})", self.name, self.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_joins_args() {
        let identity = ProcessIdentity::new(
            4321,
            "myservice",
            vec!["myservice".to_string(), "--port".to_string(), "9000".to_string()],
        );

        assert_eq!(identity.command_line(), "myservice --port 9000");
        assert_eq!(identity.to_string(), "myservice (PID: 4321)");
        assert!(identity.parent_pid.is_none());
    }
}
