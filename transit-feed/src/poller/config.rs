//! Poller configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::NetworkId;

/// Which networks the poller visits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollMode {
    /// Round-robin over every configured network.
    #[default]
    AllNetworks,
    /// Only the currently selected network.
    ActiveNetwork,
}

/// Error returned when a poll mode name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown poll mode {0:?} (expected \"all\" or \"active\")")]
pub struct InvalidPollMode(pub String);

impl FromStr for PollMode {
    type Err = InvalidPollMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(PollMode::AllNetworks),
            "active" => Ok(PollMode::ActiveNetwork),
            _ => Err(InvalidPollMode(s.to_string())),
        }
    }
}

impl fmt::Display for PollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollMode::AllNetworks => f.write_str("all"),
            PollMode::ActiveNetwork => f.write_str("active"),
        }
    }
}

/// Scheduling parameters for the poll loop.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub mode: PollMode,

    /// Pause after each network's turn in a round.
    pub turn_interval: Duration,

    /// Pause after the last network of a round.
    pub round_pause: Duration,

    /// Pause between fetches of the selected network.
    pub active_interval: Duration,

    /// Network selected at startup. Defaults to the first configured one.
    pub active_network: Option<NetworkId>,
}

impl PollerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: PollMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_turn_interval(mut self, interval: Duration) -> Self {
        self.turn_interval = interval;
        self
    }

    pub fn with_round_pause(mut self, pause: Duration) -> Self {
        self.round_pause = pause;
        self
    }

    pub fn with_active_interval(mut self, interval: Duration) -> Self {
        self.active_interval = interval;
        self
    }

    pub fn with_active_network(mut self, network: NetworkId) -> Self {
        self.active_network = Some(network);
        self
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            mode: PollMode::AllNetworks,
            turn_interval: Duration::from_secs(2),
            round_pause: Duration::from_secs(10),
            active_interval: Duration::from_secs(4),
            active_network: None,
        }
    }
}
