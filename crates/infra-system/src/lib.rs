// Warden Infrastructure - System Adapters
// Implements: PortProbe, ProcessTable, ProcessSpawner, ProcessSignaller, PidMarkerStore

pub mod detached_spawner;
pub mod file_patch;
pub mod file_pid_marker;
pub mod listener_port_probe;
pub mod log_tail;
pub mod nix_signaller;
pub mod process_table_impl;

pub use detached_spawner::DetachedSpawner;
pub use file_pid_marker::FilePidMarkerStore;
pub use listener_port_probe::ListenerPortProbe;
pub use log_tail::LogTail;
pub use nix_signaller::NixSignaller;
pub use process_table_impl::SysinfoProcessTable;
