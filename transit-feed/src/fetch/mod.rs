//! Per-network data acquisition.
//!
//! Vehicles come from the long-polling channel, stops from a REST endpoint.
//! Both are converted into domain records here.

mod convert;
mod error;
mod fetcher;
mod stops;

pub use convert::{StopListResponse, convert_stop, convert_stops, convert_vehicle, convert_vehicles};
pub use error::StopListError;
pub use fetcher::{FetchOutcome, NetworkFetcher};
pub use stops::fetch_stop_list;
