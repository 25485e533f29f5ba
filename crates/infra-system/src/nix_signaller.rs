// Process signaller implementation
// reason: nix for kill(2)/killpg(2) with typed errno
use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use tracing::debug;

use warden_core::port::{ProcessSignaller, SignalDelivery, SignalError};

/// Sends real signals; ESRCH maps to `AlreadyExited`
pub struct NixSignaller;

impl NixSignaller {
    fn target(pid: u32) -> Result<Pid, SignalError> {
        // 0 and negative values address groups or "every process"
        match i32::try_from(pid) {
            Ok(raw) if raw > 1 => Ok(Pid::from_raw(raw)),
            _ => Err(SignalError::Failed {
                pid,
                reason: "refusing to signal reserved pid".to_string(),
            }),
        }
    }

    fn map(pid: u32, result: nix::Result<()>) -> Result<SignalDelivery, SignalError> {
        match result {
            Ok(()) => Ok(SignalDelivery::Delivered),
            Err(Errno::ESRCH) => {
                debug!(pid = %pid, "No such process");
                Ok(SignalDelivery::AlreadyExited)
            }
            Err(Errno::EPERM) => Err(SignalError::PermissionDenied(pid)),
            Err(e) => Err(SignalError::Failed {
                pid,
                reason: e.to_string(),
            }),
        }
    }
}

impl ProcessSignaller for NixSignaller {
    fn terminate(&self, pid: u32) -> Result<SignalDelivery, SignalError> {
        let target = Self::target(pid)?;
        Self::map(pid, kill(target, Signal::SIGTERM))
    }

    fn kill(&self, pid: u32) -> Result<SignalDelivery, SignalError> {
        let target = Self::target(pid)?;
        Self::map(pid, kill(target, Signal::SIGKILL))
    }

    fn kill_group(&self, pgid: u32) -> Result<SignalDelivery, SignalError> {
        let target = Self::target(pgid)?;
        Self::map(pgid, killpg(target, Signal::SIGKILL))
    }
}
