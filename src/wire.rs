//! Wire codec for the counting protocol.
//!
//! ```text
//! client -> server: N        u32, big-endian
//! client -> server: payload  exactly N bytes, any fragmentation
//! server -> client: C        u32, big-endian, printable bytes in payload
//! ```
//!
//! Streams may deliver or accept data in arbitrary fragments. The helpers
//! here loop until the requested count is transferred or the peer closes;
//! a short transfer is reported by count, never mistaken for success.

use crate::error::WireError;
use bytes::{Buf, BufMut};
use std::io::{self, Read, Write};

/// Size of both fixed-width protocol messages.
pub const MESSAGE_LEN: usize = 4;

/// Declared payload length, sent by the client right after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMessage(pub u32);

/// Printable count for one connection, sent by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultMessage(pub u32);

/// A fixed-width, big-endian u32 message.
pub trait Message: Sized {
    fn from_value(value: u32) -> Self;
    fn value(&self) -> u32;

    fn encode(&self) -> [u8; MESSAGE_LEN] {
        let mut frame = [0u8; MESSAGE_LEN];
        (&mut frame[..]).put_u32(self.value());
        frame
    }

    fn decode(frame: [u8; MESSAGE_LEN]) -> Self {
        Self::from_value((&frame[..]).get_u32())
    }
}

impl Message for LengthMessage {
    fn from_value(value: u32) -> Self {
        LengthMessage(value)
    }

    fn value(&self) -> u32 {
        self.0
    }
}

impl Message for ResultMessage {
    fn from_value(value: u32) -> Self {
        ResultMessage(value)
    }

    fn value(&self) -> u32 {
        self.0
    }
}

/// Read until `buf` is full or the peer closes.
///
/// Returns the number of bytes read; less than `buf.len()` means the peer
/// closed early. `Interrupted` is retried.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Write all of `buf` unless the peer stops accepting data.
///
/// Returns the number of bytes written; less than `buf.len()` means the
/// stream accepted a zero-length write. `Interrupted` is retried.
pub fn write_full<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

/// Read one fixed-width message. Fewer than four bytes is always an error.
pub fn read_message<M: Message, R: Read + ?Sized>(reader: &mut R) -> Result<M, WireError> {
    let mut frame = [0u8; MESSAGE_LEN];
    let received = read_full(reader, &mut frame)?;
    if received < MESSAGE_LEN {
        return Err(WireError::Truncated {
            expected: MESSAGE_LEN,
            received,
        });
    }
    Ok(M::decode(frame))
}

/// Write one fixed-width message in full and flush it.
pub fn write_message<M: Message, W: Write + ?Sized>(
    writer: &mut W,
    message: &M,
) -> Result<(), WireError> {
    let frame = message.encode();
    let written = write_full(writer, &frame)?;
    if written < MESSAGE_LEN {
        return Err(WireError::ShortWrite {
            expected: MESSAGE_LEN,
            written,
        });
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedStream, Step};

    #[test]
    fn test_big_endian_encoding() {
        assert_eq!(LengthMessage(1).encode(), [0, 0, 0, 1]);
        assert_eq!(ResultMessage(0x0102_0304).encode(), [1, 2, 3, 4]);
        assert_eq!(LengthMessage::decode([0, 0, 1, 0]), LengthMessage(256));
        assert_eq!(ResultMessage::decode([0xff; 4]), ResultMessage(u32::MAX));
    }

    #[test]
    fn test_read_message_fragmented() {
        let mut stream = ScriptedStream::new(vec![
            Step::Data(vec![0]),
            Step::Data(vec![0, 0]),
            Step::Data(vec![7]),
        ]);
        let message: LengthMessage = read_message(&mut stream).unwrap();
        assert_eq!(message, LengthMessage(7));
    }

    #[test]
    fn test_read_message_retries_interrupted() {
        let mut stream = ScriptedStream::new(vec![
            Step::Data(vec![0, 0]),
            Step::Fail(io::ErrorKind::Interrupted),
            Step::Data(vec![0, 3]),
        ]);
        let message: ResultMessage = read_message(&mut stream).unwrap();
        assert_eq!(message, ResultMessage(3));
    }

    #[test]
    fn test_truncated_is_not_zero() {
        let mut stream = ScriptedStream::new(vec![Step::Data(vec![0, 0])]);
        let err = read_message::<LengthMessage, _>(&mut stream).unwrap_err();
        assert!(matches!(
            err,
            WireError::Truncated {
                expected: 4,
                received: 2
            }
        ));

        let mut empty = ScriptedStream::new(vec![]);
        let err = read_message::<LengthMessage, _>(&mut empty).unwrap_err();
        assert!(matches!(err, WireError::Truncated { received: 0, .. }));
    }

    #[test]
    fn test_read_full_stops_at_eof() {
        let mut stream = ScriptedStream::new(vec![Step::Data(b"abc".to_vec())]);
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut stream, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn test_read_full_propagates_error() {
        let mut stream = ScriptedStream::new(vec![
            Step::Data(vec![1]),
            Step::Fail(io::ErrorKind::ConnectionReset),
        ]);
        let mut buf = [0u8; 4];
        let err = read_full(&mut stream, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn test_write_message_partial_writes() {
        let mut stream = ScriptedStream::new(vec![]).with_write_limit(1);
        write_message(&mut stream, &ResultMessage(42)).unwrap();
        assert_eq!(stream.written(), &[0, 0, 0, 42]);
    }

    #[test]
    fn test_write_message_short_write() {
        let mut stream = ScriptedStream::new(vec![]).with_write_capacity(2);
        let err = write_message(&mut stream, &ResultMessage(1)).unwrap_err();
        assert!(matches!(
            err,
            WireError::ShortWrite {
                expected: 4,
                written: 2
            }
        ));
    }

    #[test]
    fn test_write_message_broken_pipe() {
        let mut stream =
            ScriptedStream::new(vec![]).with_write_error(io::ErrorKind::BrokenPipe);
        let err = write_message(&mut stream, &ResultMessage(1)).unwrap_err();
        assert!(err.is_transient());
    }
}
