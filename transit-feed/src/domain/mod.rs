//! Domain types for the transit feed.
//!
//! Network descriptors are validated at construction time; vehicle and stop
//! records are plain data produced by the normalizer.

mod network;
mod stop;
mod vehicle;

pub use network::{ChannelName, InvalidNetworkConfig, NetworkConfig, NetworkId};
pub use stop::Stop;
pub use vehicle::Vehicle;
