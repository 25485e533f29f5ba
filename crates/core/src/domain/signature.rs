// Process signatures: substring heuristics for recognizing processes

use super::ProcessIdentity;
use serde::{Deserialize, Serialize};

/// Substring patterns matched against a process's executable name or command line.
///
/// Used both as the identity signature of a managed service and as the set of
/// supervisor patterns for the tree killer. Matching is a heuristic: a process
/// matches when ANY name pattern is contained in its name, or ANY command line
/// pattern is contained in its joined command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSignature {
    pub names: Vec<String>,
    pub cmdline: Vec<String>,
}

impl ProcessSignature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, pattern: impl Into<String>) -> Self {
        self.names.push(pattern.into());
        self
    }

    pub fn cmdline(mut self, pattern: impl Into<String>) -> Self {
        self.cmdline.push(pattern.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.names.iter().all(|p| p.is_empty()) && self.cmdline.iter().all(|p| p.is_empty())
    }

    pub fn matches(&self, process: &ProcessIdentity) -> bool {
        if self
            .names
            .iter()
            .any(|p| !p.is_empty() && process.name.contains(p.as_str()))
        {
            return true;
        }

        if self.cmdline.iter().all(|p| p.is_empty()) {
            return false;
        }

        let command_line = process.command_line();
        self.cmdline
            .iter()
            .any(|p| !p.is_empty() && command_line.contains(p.as_str()))
    }
}

/// Describes background workers spawned indirectly by a service.
///
/// These are not reachable through the parent chain (they get reparented), so
/// stop sweeps the whole process table for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSweep {
    /// Interpreter name fragment (e.g. "python")
    pub interpreter: String,
    /// Optional script fragment that must also appear on the command line
    #[serde(default)]
    pub script: Option<String>,
}

impl WorkerSweep {
    /// A worker matches when its name contains the interpreter and its command
    /// line references the install directory (and the script, if configured).
    pub fn matches(&self, process: &ProcessIdentity, install_dir: &str) -> bool {
        if self.interpreter.is_empty() || install_dir.is_empty() {
            return false;
        }
        if !process.name.contains(self.interpreter.as_str()) {
            return false;
        }

        let command_line = process.command_line();
        if !command_line.contains(install_dir) {
            return false;
        }

        match &self.script {
            Some(script) => command_line.contains(script.as_str()),
            None => true,
        }
    }
}
