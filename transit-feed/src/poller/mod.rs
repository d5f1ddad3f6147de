//! Background polling of the configured networks.
//!
//! The poller either cycles through every network or repeatedly fetches a
//! single selected one. The selection lives in the poller and is changed
//! through the [`TransitFeed`](crate::feed::TransitFeed) handle.

mod config;
mod error;
mod runner;

pub use config::{InvalidPollMode, PollMode, PollerConfig};
pub use error::{PollerError, UnknownNetworkError};
pub use runner::Poller;
