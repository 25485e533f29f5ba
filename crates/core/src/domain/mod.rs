// Domain Layer - Services, process identities and outcomes

pub mod error;
pub mod outcome;
pub mod process;
pub mod service;
pub mod signature;

// Re-exports
pub use error::DomainError;
pub use outcome::{
    KillFailure, KillReport, LifecycleOutcome, MarkerState, Occupancy, ProcessRole, ServiceStatus,
    StatusReport, TerminatedProcess, TerminationKind,
};
pub use process::ProcessIdentity;
pub use service::{FilePatch, ManagedService, ReadinessPolicy, StartMode};
pub use signature::{ProcessSignature, WorkerSweep};
