//! Per-client guard against overlapping submissions across requests

use parking_lot::Mutex;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<IpAddr>>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` while another submission from `client` is still running.
    pub fn claim(&self, client: IpAddr) -> Option<InFlightClaim> {
        if self.active.lock().insert(client) {
            Some(InFlightClaim {
                registry: self.clone(),
                client,
            })
        } else {
            None
        }
    }

    pub fn is_active(&self, client: IpAddr) -> bool {
        self.active.lock().contains(&client)
    }
}

/// Releases the client's slot when dropped.
pub struct InFlightClaim {
    registry: InFlightRegistry,
    client: IpAddr,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.registry.active.lock().remove(&self.client);
    }
}
