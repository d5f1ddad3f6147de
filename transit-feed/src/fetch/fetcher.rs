//! Per-network fetch of live vehicles and stops.

use std::collections::HashMap;

use reqwest::Url;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::domain::{NetworkConfig, Stop, Vehicle};
use crate::http::{ClientConfig, HttpError, HttpTransport, RequestIdentity};
use crate::socketio::{PollingError, decode_event, read_channel};

use super::convert::convert_vehicles;
use super::error::StopListError;
use super::stops::fetch_stop_list;

/// Result of one fetch. Either field is empty when its path failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub vehicles: HashMap<String, Vehicle>,
    pub stops: Vec<Stop>,
}

impl FetchOutcome {
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty() && self.stops.is_empty()
    }
}

/// Fetches vehicles and stops for one network at a time.
///
/// The vehicle path (socket session) and the stop path (REST) are
/// independent: one failing never suppresses the other.
pub struct NetworkFetcher<T> {
    transport: T,
    config: ClientConfig,
    polling_url: Url,
}

impl<T: HttpTransport> NetworkFetcher<T> {
    pub fn new(transport: T, config: ClientConfig) -> Result<Self, HttpError> {
        let polling_url = config.polling_url()?;
        Ok(Self {
            transport,
            config,
            polling_url,
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetch the vehicle path, then the stop path. Never fails; failures are
    /// logged and turn into empty fields.
    pub async fn fetch(&self, network: &NetworkConfig) -> FetchOutcome {
        let headers = match self.identity(network).headers() {
            Ok(headers) => headers,
            Err(e) => {
                warn!(network = %network.id, error = %e, "Cannot build request headers");
                return FetchOutcome::default();
            }
        };

        let vehicles = self
            .fetch_vehicles(network, &headers)
            .await
            .unwrap_or_else(|e| {
                if e.is_no_data() {
                    debug!(network = %network.id, "No vehicle frame this cycle");
                } else {
                    warn!(
                        network = %network.id,
                        error = %e,
                        timeout = e.is_timeout(),
                        "Vehicle fetch failed"
                    );
                }
                HashMap::new()
            });

        let stops = self
            .fetch_stops(network, &headers)
            .await
            .unwrap_or_else(|e| {
                warn!(
                    network = %network.id,
                    error = %e,
                    timeout = e.is_timeout(),
                    "Stop list fetch failed"
                );
                Vec::new()
            });

        FetchOutcome { vehicles, stops }
    }

    /// Read the network's channel and convert the vehicle map.
    pub async fn fetch_vehicles(
        &self,
        network: &NetworkConfig,
        headers: &HeaderMap,
    ) -> Result<HashMap<String, Vehicle>, PollingError> {
        let endpoint = network.polling_url.as_ref().unwrap_or(&self.polling_url);

        let body = read_channel(
            &self.transport,
            endpoint,
            &network.channel,
            headers,
            self.config.settle_delay,
        )
        .await?;

        let raw = decode_event(&body, &network.channel)?;
        Ok(convert_vehicles(raw))
    }

    pub async fn fetch_stops(
        &self,
        network: &NetworkConfig,
        headers: &HeaderMap,
    ) -> Result<Vec<Stop>, StopListError> {
        fetch_stop_list(&self.transport, &network.stops_url, headers).await
    }

    /// Network overrides win over the client-wide defaults.
    fn identity<'a>(&'a self, network: &'a NetworkConfig) -> RequestIdentity<'a> {
        RequestIdentity {
            user_agent: network
                .user_agent
                .as_deref()
                .unwrap_or(&self.config.user_agent),
            origin: network.origin.as_deref().unwrap_or(&self.config.origin),
            referer: &network.referer,
            cookie: network.cookie.as_deref().or(self.config.cookie.as_deref()),
        }
    }
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;
