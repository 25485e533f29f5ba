// Supervisor constants (No magic values)
use std::time::Duration;

/// Interval between readiness probes (1s)
pub const DEFAULT_READINESS_INTERVAL: Duration = Duration::from_secs(1);

/// Readiness probes before giving up (60 probes = ~1 minute)
pub const DEFAULT_READINESS_ATTEMPTS: u32 = 60;

/// Grace period between SIGTERM and SIGKILL on stop (5 seconds)
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// How often liveness is re-checked during the grace period (100ms)
pub const TERMINATION_POLL_INTERVAL: Duration = Duration::from_millis(100);
