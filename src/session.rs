//! Connection session state machine.
//!
//! A session serves exactly one client:
//!
//! ```text
//! AwaitingLength -> ReceivingPayload -> Responding -> Closed
//!        \                 \                \
//!         +-----------------+----------------+--> Closed (aborted)
//! ```
//!
//! Transient failures (peer closed early, truncated message, timeout, reset,
//! broken pipe) end the session with `SessionOutcome::Aborted` and the delta
//! is dropped. Any other I/O error is returned as `Err` and is fatal to the
//! server.

use crate::counter::count_printable;
use crate::error::WireError;
use crate::histogram::SessionDelta;
use crate::wire::{read_full, read_message, write_message, LengthMessage, ResultMessage};
use std::io::{self, Read, Write};
use tracing::trace;

/// Current state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the 4-byte length prefix.
    AwaitingLength,
    /// Reading the declared payload.
    ReceivingPayload {
        /// Payload length declared by the client.
        declared: u32,
        /// Payload bytes received so far. Never exceeds `declared`.
        consumed: u64,
    },
    /// Sending the printable count back.
    Responding {
        /// Printable bytes found in the payload.
        count: u32,
    },
    /// Session finished. The connection is released when the session is dropped.
    Closed(Completion),
}

/// Terminal classification of a closed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Success,
    Aborted,
}

/// How a session ended.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Payload fully received and result delivered. The delta is ready to merge.
    Success {
        delta: SessionDelta,
        count: u32,
        bytes: u64,
    },
    /// Session ended early because of the peer. Nothing may be merged.
    Aborted {
        /// State the session was in when it failed.
        state: SessionState,
        error: WireError,
    },
}

/// One accepted connection and its in-progress counts.
#[derive(Debug)]
pub struct Session<S> {
    stream: S,
    state: SessionState,
    declared: u32,
    count: u32,
    delta: SessionDelta,
}

impl<S: Read + Write> Session<S> {
    /// Start a session in `AwaitingLength`.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: SessionState::AwaitingLength,
            declared: 0,
            count: 0,
            delta: SessionDelta::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Drive the session until it is closed.
    ///
    /// `chunk` is the reusable receive buffer; its length is the per-read
    /// ceiling and bounds memory regardless of the declared payload size.
    pub fn run(&mut self, chunk: &mut [u8]) -> io::Result<SessionOutcome> {
        if chunk.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "session chunk buffer must not be empty",
            ));
        }

        loop {
            match self.state {
                SessionState::Closed(Completion::Success) => {
                    return Ok(SessionOutcome::Success {
                        delta: std::mem::take(&mut self.delta),
                        count: self.count,
                        bytes: u64::from(self.declared),
                    });
                }
                SessionState::Closed(Completion::Aborted) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "session already aborted",
                    ));
                }
                _ => {}
            }

            if let Err(error) = self.step(chunk) {
                let state = self.state;
                self.state = SessionState::Closed(Completion::Aborted);
                self.delta = SessionDelta::new();
                let fatal = !error.is_transient();
                return match error {
                    WireError::Io(e) if fatal => Err(e),
                    error => Ok(SessionOutcome::Aborted { state, error }),
                };
            }
        }
    }

    /// Advance by one state, or by one chunk while receiving.
    fn step(&mut self, chunk: &mut [u8]) -> Result<(), WireError> {
        match self.state {
            SessionState::AwaitingLength => {
                let LengthMessage(declared) =
                    read_message::<LengthMessage, _>(&mut self.stream)?;
                trace!(declared, "Length received");
                self.declared = declared;
                self.state = SessionState::ReceivingPayload {
                    declared,
                    consumed: 0,
                };
            }

            SessionState::ReceivingPayload { declared, consumed } => {
                let remaining = u64::from(declared) - consumed;
                if remaining == 0 {
                    let count = u32::try_from(self.delta.total()).map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            "printable count exceeds declared length",
                        )
                    })?;
                    self.count = count;
                    self.state = SessionState::Responding { count };
                    return Ok(());
                }

                let want = remaining.min(chunk.len() as u64) as usize;
                let got = read_full(&mut self.stream, &mut chunk[..want])?;
                let consumed = consumed + got as u64;
                if got < want {
                    return Err(WireError::PeerClosed {
                        expected: u64::from(declared),
                        received: consumed,
                    });
                }

                count_printable(&chunk[..got], &mut self.delta);
                trace!(consumed, declared, "Chunk received");
                self.state = SessionState::ReceivingPayload { declared, consumed };
            }

            SessionState::Responding { count } => {
                write_message(&mut self.stream, &ResultMessage(count))?;
                trace!(count, "Result sent");
                self.state = SessionState::Closed(Completion::Success);
            }

            SessionState::Closed(_) => {}
        }
        Ok(())
    }
}
