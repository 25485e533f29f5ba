// Port Probe Port
// Finds the process currently LISTENing on a TCP port

use crate::domain::ProcessIdentity;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Failed to enumerate listening sockets: {0}")]
    Enumeration(String),
}

/// Port probe interface
///
/// Implementations must enumerate sockets system-wide, not just children of
/// the caller, since the point is to spot foreign occupants. A process that
/// exits between enumeration and identity resolution resolves to `None`.
pub trait PortProbe: Send + Sync {
    /// Identity of the process listening on `port`, or `None` if unbound
    fn occupant(&self, port: u16) -> Result<Option<ProcessIdentity>, ProbeError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Mock PortProbe replaying a scripted sequence of occupants.
    /// The last entry repeats once the script is exhausted.
    pub struct MockPortProbe {
        script: Arc<Mutex<VecDeque<Option<ProcessIdentity>>>>,
        last: Arc<Mutex<Option<ProcessIdentity>>>,
        call_count: Arc<Mutex<usize>>,
        fail: Arc<Mutex<bool>>,
    }
    impl MockPortProbe {
        pub fn new_sequence(script: Vec<Option<ProcessIdentity>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                last: Arc::new(Mutex::new(None)),
                call_count: Arc::new(Mutex::new(0)),
                fail: Arc::new(Mutex::new(false)),
            }
        }
        pub fn new_free() -> Self {
            Self::new_sequence(vec![])
        }
        pub fn new_occupied(occupant: ProcessIdentity) -> Self {
            Self::new_sequence(vec![Some(occupant)])
        }
        pub fn set_occupant(&self, occupant: Option<ProcessIdentity>) {
            self.script.lock().unwrap().clear();
            *self.last.lock().unwrap() = occupant;
        }
        pub fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }
        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }
    impl PortProbe for MockPortProbe {
        fn occupant(&self, _port: u16) -> Result<Option<ProcessIdentity>, ProbeError> {
            *self.call_count.lock().unwrap() += 1;

            if *self.fail.lock().unwrap() {
                return Err(ProbeError::Enumeration("mock failure".to_string()));
            }

            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            Ok(last.clone())
        }
    }
}
