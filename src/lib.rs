//! pcc: printable character counting over TCP.
//!
//! A client sends a big-endian `u32` length followed by that many bytes. The
//! server replies with a big-endian `u32` count of the printable ASCII bytes
//! (`0x20..=0x7E`) in the payload, and keeps a histogram of every printable
//! character seen by successful sessions, printed when it shuts down.
//!
//! The server handles one connection at a time. A failure attributable to
//! the peer ends only that connection; anything else stops the server.

pub mod client;
pub mod config;
pub mod counter;
pub mod error;
pub mod histogram;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod wire;

#[cfg(test)]
mod testing;

pub use error::{ClientError, ServerError, WireError};
pub use histogram::{Histogram, SessionDelta};
pub use server::Server;
pub use shutdown::Shutdown;
