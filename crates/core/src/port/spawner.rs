// Process Spawner Port
// Launches a service command, detached or attached to the terminal

use crate::domain::{ManagedService, ProcessIdentity};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Launch errors (surfaced as `LaunchFailed`, never retried)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("Working directory not found: {0}")]
    WorkingDirMissing(PathBuf),

    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),

    #[error("Cannot open log sink {path}: {reason}")]
    LogSink { path: PathBuf, reason: String },

    #[error("Cannot patch {path}: {reason}")]
    Patch { path: PathBuf, reason: String },

    #[error("Spawn failed: {0}")]
    SpawnFailed(String),
}

/// How a foreground run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundExit {
    Exited(Option<i32>),
    /// Operator pressed Ctrl+C; the child was not killed
    Interrupted,
}

/// Process spawner interface
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Spawn the service command in a new session with output appended to the
    /// log sink. Returns as soon as the process exists.
    ///
    /// # Errors
    /// - LaunchError::WorkingDirMissing / ExecutableNotFound before spawning
    /// - LaunchError::SpawnFailed if the OS refuses (permissions, bad interpreter)
    async fn spawn_detached(&self, service: &ManagedService)
        -> Result<ProcessIdentity, LaunchError>;

    /// Run the service command attached to the terminal until it exits or the
    /// operator interrupts.
    async fn run_foreground(&self, service: &ManagedService)
        -> Result<ForegroundExit, LaunchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock spawner behavior
    #[derive(Debug, Clone)]
    pub enum MockSpawnBehavior {
        /// Spawn "succeeds" with this identity
        Spawn(ProcessIdentity),
        /// Spawn fails
        Fail(LaunchError),
    }

    /// Mock ProcessSpawner for testing
    pub struct MockSpawner {
        behavior: Arc<Mutex<MockSpawnBehavior>>,
        foreground: Arc<Mutex<ForegroundExit>>,
        spawn_count: Arc<Mutex<usize>>,
        foreground_count: Arc<Mutex<usize>>,
    }
    impl MockSpawner {
        pub fn new(behavior: MockSpawnBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                foreground: Arc::new(Mutex::new(ForegroundExit::Exited(Some(0)))),
                spawn_count: Arc::new(Mutex::new(0)),
                foreground_count: Arc::new(Mutex::new(0)),
            }
        }
        pub fn new_spawning(identity: ProcessIdentity) -> Self {
            Self::new(MockSpawnBehavior::Spawn(identity))
        }
        pub fn new_failing(error: LaunchError) -> Self {
            Self::new(MockSpawnBehavior::Fail(error))
        }
        pub fn set_foreground_exit(&self, exit: ForegroundExit) {
            *self.foreground.lock().unwrap() = exit;
        }
        pub fn spawn_count(&self) -> usize {
            *self.spawn_count.lock().unwrap()
        }
        pub fn foreground_count(&self) -> usize {
            *self.foreground_count.lock().unwrap()
        }
    }
    #[async_trait]
    impl ProcessSpawner for MockSpawner {
        async fn spawn_detached(
            &self,
            _service: &ManagedService,
        ) -> Result<ProcessIdentity, LaunchError> {
            *self.spawn_count.lock().unwrap() += 1;

            match self.behavior.lock().unwrap().clone() {
                MockSpawnBehavior::Spawn(identity) => Ok(identity),
                MockSpawnBehavior::Fail(error) => Err(error),
            }
        }
        async fn run_foreground(
            &self,
            _service: &ManagedService,
        ) -> Result<ForegroundExit, LaunchError> {
            *self.foreground_count.lock().unwrap() += 1;

            if let MockSpawnBehavior::Fail(error) = self.behavior.lock().unwrap().clone() {
                return Err(error);
            }
            Ok(*self.foreground.lock().unwrap())
        }
    }
}
