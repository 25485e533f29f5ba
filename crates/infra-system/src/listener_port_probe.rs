// Port probe implementation
// reason: listeners for system-wide LISTEN socket enumeration
use std::sync::Arc;
use tracing::debug;

use warden_core::domain::ProcessIdentity;
use warden_core::port::{PortProbe, ProbeError, ProcessTable};

/// Port probe over the OS socket table
///
/// Sockets are matched to owners with `listeners`, then each owner is
/// re-resolved through the process table for its full identity.
pub struct ListenerPortProbe {
    table: Arc<dyn ProcessTable>,
}

impl ListenerPortProbe {
    pub fn new(table: Arc<dyn ProcessTable>) -> Self {
        Self { table }
    }
}

impl PortProbe for ListenerPortProbe {
    fn occupant(&self, port: u16) -> Result<Option<ProcessIdentity>, ProbeError> {
        let all = listeners::get_all().map_err(|e| ProbeError::Enumeration(e.to_string()))?;

        // IPv4 and IPv6 sockets of one process show up separately
        let mut owners: Vec<u32> = all
            .into_iter()
            .filter(|listener| listener.socket.port() == port)
            .map(|listener| listener.process.pid)
            .collect();
        owners.sort_unstable();
        owners.dedup();

        for pid in owners {
            match self.table.process(pid) {
                Some(identity) => {
                    debug!(port = %port, pid = %pid, name = %identity.name, "Port occupant found");
                    return Ok(Some(identity));
                }
                None => {
                    debug!(port = %port, pid = %pid, "Listener exited before it could be resolved");
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SysinfoProcessTable;
    use std::net::TcpListener;

    #[test]
    fn test_finds_own_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = ListenerPortProbe::new(Arc::new(SysinfoProcessTable::new()));

        let occupant = probe.occupant(port).unwrap().unwrap();

        assert_eq!(occupant.pid, std::process::id());
        drop(listener);
    }

    #[test]
    fn test_unbound_port_is_free() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = ListenerPortProbe::new(Arc::new(SysinfoProcessTable::new()));

        assert!(probe.occupant(port).unwrap().is_none());
    }
}
