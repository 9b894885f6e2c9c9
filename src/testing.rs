//! In-memory stream for exercising partial I/O and failure paths.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// One scripted outcome for the read side.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver these bytes, split across reads if the caller's buffer is small.
    Data(Vec<u8>),
    /// Fail the next read with this error kind.
    Fail(io::ErrorKind),
}

/// A `Read + Write` stream that replays a script of read results and
/// captures writes. Once the script is exhausted reads return end-of-stream.
#[derive(Debug, Default)]
pub struct ScriptedStream {
    steps: VecDeque<Step>,
    bytes_read: usize,
    written: Vec<u8>,
    write_limit: Option<usize>,
    write_capacity: Option<usize>,
    write_error: Option<io::ErrorKind>,
}

impl ScriptedStream {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            ..Default::default()
        }
    }

    /// Split `data` into reads of at most `fragment` bytes.
    pub fn fragmented(data: &[u8], fragment: usize) -> Self {
        Self::new(
            data.chunks(fragment.max(1))
                .map(|chunk| Step::Data(chunk.to_vec()))
                .collect(),
        )
    }

    /// Accept at most `limit` bytes per write call.
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Accept `capacity` bytes in total, then report zero-length writes.
    pub fn with_write_capacity(mut self, capacity: usize) -> Self {
        self.write_capacity = Some(capacity);
        self
    }

    /// Fail every write with `kind`.
    pub fn with_write_error(mut self, kind: io::ErrorKind) -> Self {
        self.write_error = Some(kind);
        self
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Total payload bytes handed out by `read`.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Whether scripted steps remain unread.
    pub fn has_pending(&self) -> bool {
        !self.steps.is_empty()
    }
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.steps.pop_front() {
            None => Ok(0),
            Some(Step::Fail(kind)) => Err(io::Error::from(kind)),
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.steps.push_front(Step::Data(data.split_off(n)));
                }
                self.bytes_read += n;
                Ok(n)
            }
        }
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.write_error {
            return Err(io::Error::from(kind));
        }
        let mut n = buf.len();
        if let Some(limit) = self.write_limit {
            n = n.min(limit);
        }
        if let Some(capacity) = self.write_capacity {
            n = n.min(capacity.saturating_sub(self.written.len()));
        }
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
