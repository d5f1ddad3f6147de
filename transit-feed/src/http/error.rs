//! Upstream HTTP error types.

/// Errors from a single upstream HTTP call.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Request failed (network error, timeout, body read failure)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A configured header value cannot be sent
    #[error("invalid {name} header: {message}")]
    InvalidHeader { name: &'static str, message: String },

    /// A configured URL cannot be used
    #[error("invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl HttpError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::Http(e) if e.is_timeout())
    }
}
