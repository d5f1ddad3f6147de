//! Read and control handle for a running poller.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::domain::{NetworkConfig, NetworkId, Stop, Vehicle};
use crate::poller::UnknownNetworkError;
use crate::store::{NetworkSnapshot, SnapshotStore};

/// Cloneable handle given to consumers of the feed.
///
/// Reads go straight to the snapshot store and never wait on the network.
/// Selecting the active network wakes a poller running in
/// [`PollMode::ActiveNetwork`](crate::poller::PollMode::ActiveNetwork).
#[derive(Debug, Clone)]
pub struct TransitFeed {
    networks: Arc<[NetworkConfig]>,
    store: SnapshotStore,
    active: Arc<watch::Sender<NetworkId>>,
}

impl TransitFeed {
    pub(crate) fn new(
        networks: Arc<[NetworkConfig]>,
        store: SnapshotStore,
        active: Arc<watch::Sender<NetworkId>>,
    ) -> Self {
        Self {
            networks,
            store,
            active,
        }
    }

    pub async fn vehicles(&self, network: &str) -> Arc<HashMap<String, Vehicle>> {
        self.store.vehicles(network).await
    }

    pub async fn stops(&self, network: &str) -> Arc<Vec<Stop>> {
        self.store.stops(network).await
    }

    pub async fn snapshot(&self, network: &str) -> NetworkSnapshot {
        self.store.get(network).await
    }

    /// Change the network polled in active mode.
    pub fn select_active_network(&self, network: &str) -> Result<(), UnknownNetworkError> {
        let config = self.network(network).ok_or_else(|| UnknownNetworkError {
            network: network.to_string(),
        })?;

        let changed = self.active.send_if_modified(|current| {
            if *current == config.id {
                false
            } else {
                *current = config.id.clone();
                true
            }
        });
        if changed {
            info!(network = %config.id, "Selected active network");
        }
        Ok(())
    }

    pub fn active_network(&self) -> NetworkId {
        self.active.borrow().clone()
    }

    /// Configured networks in polling order.
    pub fn networks(&self) -> &[NetworkConfig] {
        &self.networks
    }

    pub fn network(&self, network: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.id.as_str() == network)
    }

    pub fn is_configured(&self, network: &str) -> bool {
        self.network(network).is_some()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }
}
