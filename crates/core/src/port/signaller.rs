// Process Signaller Port
// Delivers termination signals; a vanished process is not an error

use thiserror::Error;

/// What happened when a signal was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDelivery {
    Delivered,
    /// Process (or group) no longer exists
    AlreadyExited,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("Permission denied signalling PID {0}")]
    PermissionDenied(u32),

    #[error("Signal to PID {pid} failed: {reason}")]
    Failed { pid: u32, reason: String },
}

/// Process signaller interface
pub trait ProcessSignaller: Send + Sync {
    /// Cooperative termination (SIGTERM)
    fn terminate(&self, pid: u32) -> Result<SignalDelivery, SignalError>;

    /// Forceful kill (SIGKILL)
    fn kill(&self, pid: u32) -> Result<SignalDelivery, SignalError>;

    /// Forceful kill of a whole process group (SIGKILL to -pgid)
    fn kill_group(&self, pgid: u32) -> Result<SignalDelivery, SignalError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::port::process_table::mocks::MockProcessTable;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SentSignal {
        Term(u32),
        Kill(u32),
        KillGroup(u32),
    }

    /// Mock signaller wired to a MockProcessTable: signalled processes leave
    /// the table unless marked stubborn (stubborn ones ignore SIGTERM).
    pub struct MockSignaller {
        table: MockProcessTable,
        stubborn: Arc<Mutex<HashSet<u32>>>,
        denied: Arc<Mutex<HashSet<u32>>>,
        sent: Arc<Mutex<Vec<SentSignal>>>,
    }
    impl MockSignaller {
        pub fn new(table: MockProcessTable) -> Self {
            Self {
                table,
                stubborn: Arc::new(Mutex::new(HashSet::new())),
                denied: Arc::new(Mutex::new(HashSet::new())),
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }
        pub fn ignore_sigterm(&self, pid: u32) {
            self.stubborn.lock().unwrap().insert(pid);
        }
        pub fn deny(&self, pid: u32) {
            self.denied.lock().unwrap().insert(pid);
        }
        pub fn sent(&self) -> Vec<SentSignal> {
            self.sent.lock().unwrap().clone()
        }
        /// Distinct pids that received any signal
        pub fn signalled_pids(&self) -> Vec<u32> {
            let mut pids: Vec<u32> = Vec::new();
            for signal in self.sent() {
                let pid = match signal {
                    SentSignal::Term(p) | SentSignal::Kill(p) | SentSignal::KillGroup(p) => p,
                };
                if !pids.contains(&pid) {
                    pids.push(pid);
                }
            }
            pids
        }
        fn deliver(&self, pid: u32, signal: SentSignal) -> Result<SignalDelivery, SignalError> {
            if self.denied.lock().unwrap().contains(&pid) {
                return Err(SignalError::PermissionDenied(pid));
            }
            if !self.table.contains(pid) {
                return Ok(SignalDelivery::AlreadyExited);
            }
            self.sent.lock().unwrap().push(signal);

            let ignores = matches!(signal, SentSignal::Term(_))
                && self.stubborn.lock().unwrap().contains(&pid);
            if !ignores {
                self.table.remove(pid);
            }
            Ok(SignalDelivery::Delivered)
        }
    }
    impl ProcessSignaller for MockSignaller {
        fn terminate(&self, pid: u32) -> Result<SignalDelivery, SignalError> {
            self.deliver(pid, SentSignal::Term(pid))
        }
        fn kill(&self, pid: u32) -> Result<SignalDelivery, SignalError> {
            self.deliver(pid, SentSignal::Kill(pid))
        }
        fn kill_group(&self, pgid: u32) -> Result<SignalDelivery, SignalError> {
            self.deliver(pgid, SentSignal::KillGroup(pgid))
        }
    }
}
