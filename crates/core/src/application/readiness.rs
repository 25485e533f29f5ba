// Readiness watcher: poll the port until our process binds it
use crate::domain::{ManagedService, Occupancy, ProcessIdentity};
use crate::error::Result;
use crate::port::{PortProbe, Sleeper};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Readiness decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Port bound by a process matching the service signature
    Ready(ProcessIdentity),
    /// Port bound by something else; the caller must clean up its spawn
    PortConflict(ProcessIdentity),
    /// Port still unbound after every attempt
    Timeout { attempts: u32, waited: Duration },
}

/// Port occupancy is the only externally observable readiness signal: the
/// launched process may fork, daemonize, or build for a while before binding.
pub struct ReadinessWatcher {
    probe: Arc<dyn PortProbe>,
    sleeper: Arc<dyn Sleeper>,
}

impl ReadinessWatcher {
    pub fn new(probe: Arc<dyn PortProbe>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { probe, sleeper }
    }

    /// Poll `service.port` once per `readiness.interval`, up to
    /// `readiness.attempts` times. Returns on the first bound occupant.
    ///
    /// # Arguments
    /// * `service` - Service being started
    /// * `spawned` - Process we just launched (None for a pre-existing instance)
    pub async fn watch(
        &self,
        service: &ManagedService,
        spawned: Option<&ProcessIdentity>,
    ) -> Result<Readiness> {
        let policy = service.readiness;
        let mut waited = Duration::ZERO;

        info!(
            service = %service.name,
            port = %service.port,
            spawned_pid = ?spawned.map(|p| p.pid),
            attempts = %policy.attempts,
            "Waiting for service to bind port"
        );

        for attempt in 1..=policy.attempts {
            match Occupancy::classify(service, self.probe.occupant(service.port)?) {
                Occupancy::Own(process) => {
                    info!(
                        service = %service.name,
                        pid = %process.pid,
                        attempt = %attempt,
                        "Service ready"
                    );
                    return Ok(Readiness::Ready(process));
                }
                Occupancy::Foreign(process) => {
                    warn!(
                        service = %service.name,
                        port = %service.port,
                        occupant = %process,
                        "Port taken by a foreign process during startup"
                    );
                    return Ok(Readiness::PortConflict(process));
                }
                Occupancy::Free => {
                    debug!(attempt = %attempt, port = %service.port, "Port not bound yet");
                }
            }

            self.sleeper.sleep(policy.interval).await;
            waited += policy.interval;
        }

        warn!(
            service = %service.name,
            port = %service.port,
            waited_secs = %waited.as_secs(),
            "Timed out waiting for port"
        );

        Ok(Readiness::Timeout {
            attempts: policy.attempts,
            waited,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProcessSignature, ReadinessPolicy};
    use crate::port::port_probe::mocks::MockPortProbe;
    use crate::port::sleeper::mocks::RecordingSleeper;

    fn service() -> ManagedService {
        ManagedService::new("svc", 9000, "/opt/svc", vec!["myservice".to_string()])
            .with_signature(ProcessSignature::new().name("myservice"))
            .with_readiness(ReadinessPolicy {
                interval: Duration::from_secs(1),
                attempts: 5,
            })
    }

    fn own() -> ProcessIdentity {
        ProcessIdentity::new(4321, "myservice", vec!["myservice".to_string()])
    }

    #[tokio::test]
    async fn test_ready_on_first_match_without_extra_sleep() {
        let probe = Arc::new(MockPortProbe::new_sequence(vec![None, None, Some(own())]));
        let sleeper = RecordingSleeper::new();
        let watcher = ReadinessWatcher::new(probe.clone(), Arc::new(sleeper.clone()));

        let result = watcher.watch(&service(), Some(&own())).await.unwrap();

        assert_eq!(result, Readiness::Ready(own()));
        assert_eq!(probe.call_count(), 3);
        assert_eq!(sleeper.sleep_count(), 2);
    }

    #[tokio::test]
    async fn test_already_bound_returns_immediately() {
        let sleeper = RecordingSleeper::new();
        let watcher = ReadinessWatcher::new(
            Arc::new(MockPortProbe::new_occupied(own())),
            Arc::new(sleeper.clone()),
        );

        let result = watcher.watch(&service(), None).await.unwrap();

        assert_eq!(result, Readiness::Ready(own()));
        assert_eq!(sleeper.sleep_count(), 0);
    }

    #[tokio::test]
    async fn test_foreign_occupant_is_conflict() {
        let foreign = ProcessIdentity::new(55, "otherapp", vec![]);
        let watcher = ReadinessWatcher::new(
            Arc::new(MockPortProbe::new_sequence(vec![None, Some(foreign.clone())])),
            Arc::new(RecordingSleeper::new()),
        );

        let result = watcher.watch(&service(), Some(&own())).await.unwrap();

        assert_eq!(result, Readiness::PortConflict(foreign));
    }

    #[tokio::test]
    async fn test_timeout_exhausts_attempts() {
        let probe = Arc::new(MockPortProbe::new_free());
        let sleeper = RecordingSleeper::new();
        let watcher = ReadinessWatcher::new(probe.clone(), Arc::new(sleeper.clone()));

        let result = watcher.watch(&service(), Some(&own())).await.unwrap();

        assert_eq!(
            result,
            Readiness::Timeout {
                attempts: 5,
                waited: Duration::from_secs(5),
            }
        );
        assert_eq!(probe.call_count(), 5);
        assert_eq!(sleeper.total(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_probe_error_propagates() {
        let probe = Arc::new(MockPortProbe::new_free());
        probe.set_failing(true);
        let watcher = ReadinessWatcher::new(probe, Arc::new(RecordingSleeper::new()));

        assert!(watcher.watch(&service(), None).await.is_err());
    }
}
