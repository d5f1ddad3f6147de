//! Latest-known vehicles and stops per network.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{NetworkId, Stop, Vehicle};

/// Everything known about one network, as of the last successful fetches.
///
/// Fields are shared pointers, so cloning a snapshot is cheap and a reader
/// holding one never observes a later write.
#[derive(Debug, Clone, Default)]
pub struct NetworkSnapshot {
    pub vehicles: Arc<HashMap<String, Vehicle>>,
    pub stops: Arc<Vec<Stop>>,
    pub vehicles_updated_at: Option<DateTime<Utc>>,
    pub stops_updated_at: Option<DateTime<Utc>>,
}

/// Which fields a [`SnapshotStore::put`] replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PutOutcome {
    pub vehicles_replaced: bool,
    pub stops_replaced: bool,
}

/// Thread-safe snapshot store.
///
/// An empty fetch result never overwrites data: whatever was last seen is
/// kept until a non-empty replacement arrives. Reads for networks that have
/// never been written return empty collections.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<HashMap<NetworkId, NetworkSnapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace each non-empty field. Both fields change under one write
    /// lock, so readers see either the old pair or the new one.
    pub async fn put(
        &self,
        network: &NetworkId,
        vehicles: HashMap<String, Vehicle>,
        stops: Vec<Stop>,
    ) -> PutOutcome {
        let outcome = PutOutcome {
            vehicles_replaced: !vehicles.is_empty(),
            stops_replaced: !stops.is_empty(),
        };
        if !outcome.vehicles_replaced && !outcome.stops_replaced {
            return outcome;
        }

        let now = Utc::now();
        let vehicles = outcome.vehicles_replaced.then(|| Arc::new(vehicles));
        let stops = outcome.stops_replaced.then(|| Arc::new(stops));

        let mut guard = self.inner.write().await;
        let snapshot = guard.entry(network.clone()).or_default();
        if let Some(vehicles) = vehicles {
            snapshot.vehicles = vehicles;
            snapshot.vehicles_updated_at = Some(now);
        }
        if let Some(stops) = stops {
            snapshot.stops = stops;
            snapshot.stops_updated_at = Some(now);
        }

        outcome
    }

    pub async fn get(&self, network: &str) -> NetworkSnapshot {
        let guard = self.inner.read().await;
        guard.get(network).cloned().unwrap_or_default()
    }

    pub async fn vehicles(&self, network: &str) -> Arc<HashMap<String, Vehicle>> {
        let guard = self.inner.read().await;
        guard
            .get(network)
            .map(|s| Arc::clone(&s.vehicles))
            .unwrap_or_default()
    }

    pub async fn stops(&self, network: &str) -> Arc<Vec<Stop>> {
        let guard = self.inner.read().await;
        guard
            .get(network)
            .map(|s| Arc::clone(&s.stops))
            .unwrap_or_default()
    }

    /// Networks that have received at least one write, sorted.
    pub async fn networks(&self) -> Vec<NetworkId> {
        let guard = self.inner.read().await;
        let mut ids: Vec<NetworkId> = guard.keys().cloned().collect();
        ids.sort();
        ids
    }
}
