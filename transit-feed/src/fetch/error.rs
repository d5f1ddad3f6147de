//! Stop-list error types.

use crate::http::HttpError;

/// Errors that can occur when fetching a network's stop list.
#[derive(Debug, thiserror::Error)]
pub enum StopListError {
    /// The request failed or timed out
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}

impl StopListError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, StopListError::Transport(e) if e.is_timeout())
    }
}
