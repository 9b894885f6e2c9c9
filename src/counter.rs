//! Printable ASCII counting.
//!
//! The counter is fed one received chunk at a time. Chunking only bounds
//! memory: summing the per-chunk results gives the same count as one pass
//! over the whole payload.

use crate::histogram::SessionDelta;

/// Lowest printable ASCII byte (space).
pub const PRINTABLE_MIN: u8 = b' ';

/// Highest printable ASCII byte (tilde).
pub const PRINTABLE_MAX: u8 = b'~';

/// Number of distinct printable ASCII values.
pub const PRINTABLE_COUNT: usize = (PRINTABLE_MAX - PRINTABLE_MIN) as usize + 1;

/// Returns true if `byte` is in the printable range `[32, 126]`.
#[inline]
pub fn is_printable(byte: u8) -> bool {
    (PRINTABLE_MIN..=PRINTABLE_MAX).contains(&byte)
}

/// Count printable bytes in `chunk`, recording each one in `delta`.
///
/// Returns the number of printable bytes found in this chunk only.
pub fn count_printable(chunk: &[u8], delta: &mut SessionDelta) -> u64 {
    let mut count = 0;
    for &byte in chunk {
        if is_printable(byte) {
            delta.record(byte);
            count += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_range() {
        assert_eq!(PRINTABLE_COUNT, 95);
        assert!(is_printable(b' '));
        assert!(is_printable(b'~'));
        assert!(is_printable(b'A'));
        assert!(!is_printable(31));
        assert!(!is_printable(127));
        assert!(!is_printable(b'\n'));
        assert!(!is_printable(0xff));
    }

    #[test]
    fn test_count_hi() {
        let mut delta = SessionDelta::new();
        assert_eq!(count_printable(b"Hi!\n", &mut delta), 3);
        assert_eq!(delta.get(b'H'), 1);
        assert_eq!(delta.get(b'i'), 1);
        assert_eq!(delta.get(b'!'), 1);
        assert_eq!(delta.total(), 3);
    }

    #[test]
    fn test_count_empty() {
        let mut delta = SessionDelta::new();
        assert_eq!(count_printable(&[], &mut delta), 0);
        assert_eq!(delta.total(), 0);
    }

    #[test]
    fn test_chunked_equals_whole() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();

        let mut whole = SessionDelta::new();
        let expected = count_printable(&data, &mut whole);

        for chunk_size in [1, 3, 7, 64, 255, 999, 1000] {
            let mut chunked = SessionDelta::new();
            let sum: u64 = data
                .chunks(chunk_size)
                .map(|chunk| count_printable(chunk, &mut chunked))
                .sum();
            assert_eq!(sum, expected, "chunk size {chunk_size}");
            assert_eq!(chunked, whole, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn test_uneven_partition() {
        let data = b"The quick brown fox\tjumps\r\nover the lazy dog\x00\x7f~";
        let mut whole = SessionDelta::new();
        let expected = count_printable(data, &mut whole);

        let mut parts = SessionDelta::new();
        let (a, rest) = data.split_at(5);
        let (b, c) = rest.split_at(17);
        let sum = count_printable(a, &mut parts)
            + count_printable(b, &mut parts)
            + count_printable(c, &mut parts);

        assert_eq!(sum, expected);
        assert_eq!(parts, whole);
    }
}
