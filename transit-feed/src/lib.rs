//! Live vehicle positions and stop lists for Polish city transit networks.
//!
//! A background [`Poller`](poller::Poller) reads each configured network's
//! real-time channel over socket.io long-polling, fetches its stop list, and
//! keeps the latest result in a [`SnapshotStore`](store::SnapshotStore).
//! Consumers read through a [`TransitFeed`](feed::TransitFeed) handle.

pub mod config;
pub mod domain;
pub mod feed;
pub mod fetch;
pub mod http;
pub mod poller;
pub mod socketio;
pub mod store;
