// Process Table Port
// Read-only view of the live OS process table

use crate::domain::ProcessIdentity;

/// Process table interface
///
/// Every call re-resolves against the live table; implementations must not
/// hand back cached identities.
pub trait ProcessTable: Send + Sync {
    /// Snapshot of one process, `None` if it does not exist
    fn process(&self, pid: u32) -> Option<ProcessIdentity>;

    /// Snapshot of every visible process
    fn processes(&self) -> Vec<ProcessIdentity>;

    /// True if the process exists and is not a zombie
    fn is_alive(&self, pid: u32) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    /// In-memory process table for building synthetic process trees
    #[derive(Clone, Default)]
    pub struct MockProcessTable {
        processes: Arc<Mutex<BTreeMap<u32, ProcessIdentity>>>,
    }
    impl MockProcessTable {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn insert(&self, process: ProcessIdentity) {
            self.processes.lock().unwrap().insert(process.pid, process);
        }
        /// Add a process with the given parent
        pub fn spawn(&self, pid: u32, parent: Option<u32>, name: &str, cmdline: &[&str]) {
            let mut process =
                ProcessIdentity::new(pid, name, cmdline.iter().map(|s| s.to_string()).collect());
            process.parent_pid = parent;
            self.insert(process);
        }
        pub fn remove(&self, pid: u32) -> bool {
            self.processes.lock().unwrap().remove(&pid).is_some()
        }
        pub fn contains(&self, pid: u32) -> bool {
            self.processes.lock().unwrap().contains_key(&pid)
        }
        pub fn len(&self) -> usize {
            self.processes.lock().unwrap().len()
        }
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }
    impl ProcessTable for MockProcessTable {
        fn process(&self, pid: u32) -> Option<ProcessIdentity> {
            self.processes.lock().unwrap().get(&pid).cloned()
        }
        fn processes(&self) -> Vec<ProcessIdentity> {
            self.processes.lock().unwrap().values().cloned().collect()
        }
        fn is_alive(&self, pid: u32) -> bool {
            self.contains(pid)
        }
    }
}
