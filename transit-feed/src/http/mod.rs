//! Upstream HTTP access.
//!
//! Every request to the real-time backend goes through [`HttpTransport`],
//! carries the per-network identity headers and a bounded timeout.

mod client;
mod error;
#[cfg(test)]
pub(crate) mod mock;

pub use client::{ClientConfig, DEFAULT_POLLING_URL, HttpTransport, RequestIdentity, ReqwestTransport};
pub use error::HttpError;
