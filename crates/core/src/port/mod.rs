// Port Layer - Interfaces for OS dependencies

pub mod pid_marker;
pub mod port_probe;
pub mod process_table;
pub mod signaller;
pub mod sleeper;
pub mod spawner;

// Re-exports
pub use pid_marker::{MarkerError, PidMarkerStore};
pub use port_probe::{PortProbe, ProbeError};
pub use process_table::ProcessTable;
pub use signaller::{ProcessSignaller, SignalDelivery, SignalError};
pub use sleeper::{Sleeper, TokioSleeper};
pub use spawner::{ForegroundExit, LaunchError, ProcessSpawner};
