//! Error types shared by the server and client.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while moving protocol bytes over a stream.
#[derive(Debug, Error)]
pub enum WireError {
    /// I/O error reported by the transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed before a fixed-width message was complete.
    #[error("truncated message: expected {expected} bytes, received {received}")]
    Truncated { expected: usize, received: usize },

    /// Peer closed before the declared payload length was delivered.
    #[error("peer closed after {received} of {expected} payload bytes")]
    PeerClosed { expected: u64, received: u64 },

    /// Peer stopped accepting data before the message was fully written.
    #[error("short write: wrote {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },
}

impl WireError {
    /// Whether the failure is attributable to the peer rather than to this
    /// process. Transient errors end the current connection only.
    pub fn is_transient(&self) -> bool {
        match self {
            WireError::Io(e) => is_transient_io(e),
            WireError::Truncated { .. }
            | WireError::PeerClosed { .. }
            | WireError::ShortWrite { .. } => true,
        }
    }
}

/// Timeout, reset and broken pipe are the transport conditions blamed on the peer.
fn is_transient_io(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe
    )
}

/// Fatal server errors. Any of these stops the process without printing the
/// histogram.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot accept connection: {0}")]
    Accept(#[source] io::Error),

    #[error("cannot wait for connections: {0}")]
    Poll(#[source] io::Error),

    #[error("non-transient error during session: {0}")]
    Session(#[source] io::Error),

    #[error("cannot install signal handler: {0}")]
    Signal(#[source] io::Error),
}

/// Client failures. The client reports these and exits non-zero.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot open '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("payload of {size} bytes exceeds the protocol's {} byte limit", u32::MAX)]
    TooLarge { size: u64 },

    #[error("cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot read payload source: {0}")]
    Source(#[source] io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),
}
