//! Client side of the upstream long-polling transport.
//!
//! The upstream pushes vehicle positions over a socket namespace per city.
//! We never hold a connection open: each fetch negotiates a fresh polling
//! session, joins the city's channel, waits briefly and reads one batch of
//! frames.
//!
//! Frames are tokenized explicitly (see [`packet`]) rather than located by
//! substring search, so stray or malformed frames fail predictably.

mod decode;
mod error;
pub mod packet;
mod session;

pub use decode::{RawVehicles, decode_event};
pub use error::PollingError;
pub use session::{Handshake, Session, parse_handshake, read_channel};
