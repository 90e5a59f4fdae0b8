//! Channel server transport.
//!
//! The wire format is one JSON object per line in each direction; byte-level
//! game packet encoding lives outside this crate.

mod connection;
mod listener;

pub use connection::Connection;
pub use listener::{ChannelServer, ConnectionPermit};
