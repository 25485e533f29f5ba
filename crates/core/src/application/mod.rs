// Application Layer - Supervisor use cases

pub mod constants;
pub mod launcher;
pub mod lifecycle;
pub mod readiness;
pub mod tree_killer;

// Re-exports
pub use launcher::ProcessLauncher;
pub use lifecycle::LifecycleController;
pub use readiness::{Readiness, ReadinessWatcher};
pub use tree_killer::SupervisorTreeKiller;
