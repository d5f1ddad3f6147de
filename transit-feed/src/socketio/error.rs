//! Long-polling session error types.

use crate::http::HttpError;

use super::packet::FrameError;

/// Errors from one attempt to read a channel over the polling transport.
#[derive(Debug, thiserror::Error)]
pub enum PollingError {
    /// An HTTP call failed or timed out
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// The handshake response carried no usable session id
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The poll returned no event frame for the channel.
    ///
    /// Expected whenever no vehicles are running.
    #[error("no event frame for channel {channel}")]
    NoDataFrame { channel: String },

    /// The body or the event payload has an unexpected shape
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The upstream refused the channel join
    #[error("channel {channel} rejected the connection: {message}")]
    NamespaceRejected { channel: String, message: String },
}

impl From<FrameError> for PollingError {
    fn from(err: FrameError) -> Self {
        PollingError::MalformedFrame(err.to_string())
    }
}

impl PollingError {
    /// Whether this is the routine "nothing to report" outcome.
    pub fn is_no_data(&self) -> bool {
        matches!(self, PollingError::NoDataFrame { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PollingError::Transport(e) if e.is_timeout())
    }
}
