//! Per-session and process-wide printable character histograms.
//!
//! Both types store one counter per printable ASCII value in a fixed array,
//! indexed by `byte - PRINTABLE_MIN`.
//!
//! A `SessionDelta` is built up while a connection's payload is received and
//! is only folded into the `Histogram` once that session completes cleanly.
//! Aborted sessions drop their delta, so the histogram never sees a partial
//! contribution.

use crate::counter::{is_printable, PRINTABLE_COUNT, PRINTABLE_MIN};
use std::fmt;

#[inline]
fn slot(byte: u8) -> usize {
    debug_assert!(is_printable(byte), "byte {byte} outside printable range");
    (byte - PRINTABLE_MIN) as usize
}

/// Character counts for a single connection, not yet merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDelta {
    counts: [u64; PRINTABLE_COUNT],
}

impl SessionDelta {
    /// Create an empty delta.
    pub fn new() -> Self {
        Self {
            counts: [0; PRINTABLE_COUNT],
        }
    }

    /// Increment the bucket for a printable `byte`.
    #[inline]
    pub fn record(&mut self, byte: u8) {
        self.counts[slot(byte)] += 1;
    }

    /// Count recorded for `byte`. Non-printable bytes always report zero.
    pub fn get(&self, byte: u8) -> u64 {
        if is_printable(byte) {
            self.counts[slot(byte)]
        } else {
            0
        }
    }

    /// Sum over all buckets: the session's printable count.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Default for SessionDelta {
    fn default() -> Self {
        Self::new()
    }
}

/// Cumulative character counts across every successful session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    totals: [u64; PRINTABLE_COUNT],
}

impl Histogram {
    /// Create a histogram with every count at zero.
    pub fn new() -> Self {
        Self {
            totals: [0; PRINTABLE_COUNT],
        }
    }

    /// Add every bucket of a completed session's delta.
    pub fn merge(&mut self, delta: &SessionDelta) {
        for (total, count) in self.totals.iter_mut().zip(delta.counts.iter()) {
            *total += count;
        }
    }

    /// Cumulative count for `byte`. Non-printable bytes always report zero.
    pub fn get(&self, byte: u8) -> u64 {
        if is_printable(byte) {
            self.totals[slot(byte)]
        } else {
            0
        }
    }

    /// All 95 `(byte, count)` pairs in ascending byte order, zeros included.
    pub fn entries(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.totals
            .iter()
            .enumerate()
            .map(|(i, &count)| (PRINTABLE_MIN + i as u8, count))
    }

    /// Sum over all buckets.
    pub fn total(&self) -> u64 {
        self.totals.iter().sum()
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders the shutdown listing, one `char '<c>' : <n> times` line per value.
impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (byte, count) in self.entries() {
            writeln!(f, "char '{}' : {} times", byte as char, count)?;
        }
        Ok(())
    }
}
