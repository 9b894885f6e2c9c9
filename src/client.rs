//! Protocol initiator.
//!
//! Sends a length prefix, streams the payload in bounded chunks, and reads
//! back the printable count. Any failure is returned to the caller; there is
//! no retry.

use crate::error::{ClientError, WireError};
use crate::wire::{
    read_full, read_message, write_full, write_message, LengthMessage, ResultMessage,
};
use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use tracing::debug;

/// Largest chunk read from the payload source per write.
pub const SEND_CHUNK_SIZE: usize = 1 << 20;

/// A connected client for one request.
pub struct Client<S = TcpStream> {
    stream: S,
}

impl Client<TcpStream> {
    /// Connect to `addr` (`host:port`).
    pub fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).map_err(|source| ClientError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        debug!(addr, "Connected");
        Ok(Client { stream })
    }
}

impl<S: Read + Write> Client<S> {
    pub fn new(stream: S) -> Self {
        Client { stream }
    }

    /// Send an in-memory payload and return the server's count.
    pub fn count_bytes(self, payload: &[u8]) -> Result<u32, ClientError> {
        let len = u32::try_from(payload.len()).map_err(|_| ClientError::TooLarge {
            size: payload.len() as u64,
        })?;
        self.count(payload, len)
    }

    /// Send exactly `len` bytes read from `source` and return the count.
    ///
    /// `source` must yield at least `len` bytes.
    pub fn count<R: Read>(mut self, mut source: R, len: u32) -> Result<u32, ClientError> {
        write_message(&mut self.stream, &LengthMessage(len))?;

        let mut buf = vec![0u8; SEND_CHUNK_SIZE.min(len as usize)];
        let mut remaining = u64::from(len);
        while remaining > 0 {
            let want = remaining.min(buf.len() as u64) as usize;
            let got = read_full(&mut source, &mut buf[..want]).map_err(ClientError::Source)?;
            if got == 0 {
                return Err(ClientError::Source(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("payload source ended with {remaining} bytes left to send"),
                )));
            }

            let written = write_full(&mut self.stream, &buf[..got]).map_err(WireError::from)?;
            if written < got {
                return Err(WireError::ShortWrite {
                    expected: got,
                    written,
                }
                .into());
            }
            remaining -= got as u64;
        }
        self.stream.flush().map_err(WireError::from)?;
        debug!(sent = len, "Payload sent");

        let ResultMessage(count) = read_message::<ResultMessage, _>(&mut self.stream)?;
        Ok(count)
    }
}

/// Send the contents of the file at `path` to `addr` and return the count.
pub fn count_file(addr: &str, path: &Path) -> Result<u32, ClientError> {
    let file = File::open(path).map_err(|source| ClientError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let size = file
        .metadata()
        .map_err(|source| ClientError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    let len = u32::try_from(size).map_err(|_| ClientError::TooLarge { size })?;

    Client::connect(addr)?.count(file, len)
}
