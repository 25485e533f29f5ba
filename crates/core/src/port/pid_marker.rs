// PID Marker Store Port
// Advisory "last pid we launched" record, one per service

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("PID marker {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

/// PID marker store interface
///
/// A marker asserts only that a start was attempted. Callers must check the
/// pid against the live process table before trusting it.
pub trait PidMarkerStore: Send + Sync {
    /// Stored pid; `None` when the marker is missing or unreadable as a pid
    fn read(&self, path: &Path) -> Result<Option<u32>, MarkerError>;

    /// Create or overwrite the marker
    fn write(&self, path: &Path, pid: u32) -> Result<(), MarkerError>;

    /// Delete the marker. Returns whether a marker existed.
    fn remove(&self, path: &Path) -> Result<bool, MarkerError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory marker store
    #[derive(Clone, Default)]
    pub struct MockPidMarkerStore {
        markers: Arc<Mutex<HashMap<PathBuf, u32>>>,
    }
    impl MockPidMarkerStore {
        pub fn new() -> Self {
            Self::default()
        }
        pub fn with_marker(path: impl Into<PathBuf>, pid: u32) -> Self {
            let store = Self::new();
            store.markers.lock().unwrap().insert(path.into(), pid);
            store
        }
        pub fn get(&self, path: &Path) -> Option<u32> {
            self.markers.lock().unwrap().get(path).copied()
        }
    }
    impl PidMarkerStore for MockPidMarkerStore {
        fn read(&self, path: &Path) -> Result<Option<u32>, MarkerError> {
            Ok(self.get(path))
        }
        fn write(&self, path: &Path, pid: u32) -> Result<(), MarkerError> {
            self.markers.lock().unwrap().insert(path.to_path_buf(), pid);
            Ok(())
        }
        fn remove(&self, path: &Path) -> Result<bool, MarkerError> {
            Ok(self.markers.lock().unwrap().remove(path).is_some())
        }
    }
}
