//! Poller error types.

/// A network id that is not in the configured list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network: {network}")]
pub struct UnknownNetworkError {
    pub network: String,
}

/// Errors that prevent a poller from being built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PollerError {
    #[error("no networks configured")]
    NoNetworks,

    #[error("initial active network: {0}")]
    UnknownNetwork(#[from] UnknownNetworkError),
}
