use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transit_feed::config::{Settings, load_networks};
use transit_feed::feed::TransitFeed;
use transit_feed::fetch::NetworkFetcher;
use transit_feed::http::ReqwestTransport;
use transit_feed::poller::Poller;
use transit_feed::store::SnapshotStore;

/// How often to log a summary of what the store holds.
const STATUS_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,transit_feed=info".into()),
        )
        .init();

    let settings = Settings::from_env().expect("Failed to read settings");
    let networks = load_networks(&settings.networks_path).expect("Failed to load networks");
    tracing::info!(
        networks = networks.len(),
        path = %settings.networks_path.display(),
        mode = %settings.mode,
        "Loaded configuration"
    );

    let client_config = settings.client_config();
    let transport = ReqwestTransport::new(&client_config).expect("Failed to create HTTP client");
    let fetcher =
        NetworkFetcher::new(transport, client_config).expect("Failed to create network fetcher");
    let poller = Poller::new(
        fetcher,
        networks,
        settings.poller_config(),
        SnapshotStore::new(),
    )
    .expect("Failed to create poller");

    let feed = poller.feed();
    let poller_task = tokio::spawn(poller.run());

    tokio::select! {
        _ = log_status(feed) => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        }
    }

    tracing::info!("Shutting down");
    poller_task.abort();
}

/// Periodically log how much each network holds and how old it is.
async fn log_status(feed: TransitFeed) {
    let mut interval = tokio::time::interval(STATUS_INTERVAL);
    interval.tick().await; // First tick is immediate, skip it
    loop {
        interval.tick().await;
        let now = chrono::Utc::now();
        for network in feed.networks() {
            let snapshot = feed.snapshot(network.id.as_str()).await;
            let age_secs = snapshot
                .vehicles_updated_at
                .map(|at| (now - at).num_seconds());
            tracing::info!(
                network = %network.id,
                vehicles = snapshot.vehicles.len(),
                stops = snapshot.stops.len(),
                vehicles_age_secs = ?age_secs,
                "Network status"
            );
        }
    }
}
