//! The long-running poll loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::{NetworkConfig, NetworkId};
use crate::feed::TransitFeed;
use crate::fetch::NetworkFetcher;
use crate::http::HttpTransport;
use crate::store::{PutOutcome, SnapshotStore};

use super::config::{PollMode, PollerConfig};
use super::error::{PollerError, UnknownNetworkError};

/// Periodically fetches networks and writes the results to the store.
///
/// Networks are fetched one at a time. Failures are absorbed by the fetcher,
/// so the loop never stops on a bad network.
pub struct Poller<T> {
    fetcher: NetworkFetcher<T>,
    config: PollerConfig,
    feed: TransitFeed,
    active: watch::Receiver<NetworkId>,
}

impl<T: HttpTransport> Poller<T> {
    pub fn new(
        fetcher: NetworkFetcher<T>,
        networks: Vec<NetworkConfig>,
        config: PollerConfig,
        store: SnapshotStore,
    ) -> Result<Self, PollerError> {
        let first = networks.first().ok_or(PollerError::NoNetworks)?;
        let initial = match &config.active_network {
            Some(id) if networks.iter().any(|n| &n.id == id) => id.clone(),
            Some(id) => {
                return Err(UnknownNetworkError {
                    network: id.to_string(),
                }
                .into());
            }
            None => first.id.clone(),
        };

        let (sender, active) = watch::channel(initial);
        let feed = TransitFeed::new(networks.into(), store, Arc::new(sender));

        Ok(Self {
            fetcher,
            config,
            feed,
            active,
        })
    }

    /// Handle for reading snapshots and selecting the active network.
    pub fn feed(&self) -> TransitFeed {
        self.feed.clone()
    }

    /// Poll forever.
    pub async fn run(mut self) {
        info!(
            mode = %self.config.mode,
            networks = self.feed.networks().len(),
            active = %self.feed.active_network(),
            "Poller started"
        );

        loop {
            match self.config.mode {
                PollMode::AllNetworks => self.run_round().await,
                PollMode::ActiveNetwork => self.run_active_turn().await,
            }
        }
    }

    /// One pass over every configured network, in order.
    pub async fn run_round(&self) {
        let networks = self.feed.networks();
        for (index, network) in networks.iter().enumerate() {
            self.poll_network(network).await;
            if index + 1 < networks.len() {
                pause(self.config.turn_interval).await;
            }
        }
        pause(self.config.round_pause).await;
    }

    /// Fetch the selected network, then wait for the interval or for a new
    /// selection, whichever comes first.
    async fn run_active_turn(&mut self) {
        let id = self.active.borrow_and_update().clone();
        match self.feed.network(id.as_str()) {
            Some(network) => {
                self.poll_network(network).await;
            }
            None => warn!(network = %id, "Selected network is not configured"),
        }

        let interval = self.config.active_interval;
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = self.active.changed() => {
                if changed.is_err() {
                    // Every sender is gone, so no wake-up can come.
                    pause(interval).await;
                }
            }
        }
    }

    /// Fetch one network and store whatever came back.
    pub async fn poll_network(&self, network: &NetworkConfig) -> PutOutcome {
        let outcome = self.fetcher.fetch(network).await;
        let vehicles = outcome.vehicles.len();
        let stops = outcome.stops.len();

        let put = self
            .feed
            .store()
            .put(&network.id, outcome.vehicles, outcome.stops)
            .await;

        info!(
            network = %network.id,
            vehicles,
            stops,
            vehicles_replaced = put.vehicles_replaced,
            stops_replaced = put.stops_replaced,
            "Polled network"
        );
        put
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
