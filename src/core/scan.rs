/// Character boundary search over NUL-terminated byte buffers.
///
/// Positions are byte offsets. A position is a boundary when it is 0, the
/// string length, or the first byte of a decodable character. Every entry
/// point accepts an arbitrary seed and recovers onto a boundary; invalid
/// bytes are stepped over one at a time.
///
/// There is no backward decoder, so `find_prev` rescans from the start of the
/// buffer. Its cost is proportional to the seed, which for an edited line is
/// small.

use crate::core::backend::EncodingBackend;
use crate::core::utf8::{DecodeState, Decoded};
use crate::core::width::WidthCache;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScanFlags: u8 {
        /// Only stop on characters that occupy at least one column.
        const FIND_NONZERO = 0b0000_0001;
    }
}

/// Length of the string in `buf`: up to the first NUL, or the whole slice.
pub fn c_strlen(buf: &[u8]) -> usize {
    buf.iter().position(|&b| b == 0).unwrap_or(buf.len())
}

/// Bytes from `pos` to the end of the string; empty when `pos` is past it.
pub(crate) fn tail(buf: &[u8], pos: usize) -> &[u8] {
    buf.get(pos..c_strlen(buf)).unwrap_or(&[])
}

/// What one decoding step found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Char { len: usize, codepoint: u32 },
    /// An undecodable byte, taken as a one-byte character.
    Byte,
    /// A valid prefix cut off by the end of the string.
    Truncated,
    End,
}

/// Consume one character. Errors leave the state clean.
fn consume(backend: &dyn EncodingBackend, bytes: &[u8], state: &mut DecodeState) -> Step {
    match backend.decode(bytes, state) {
        Decoded::Char { len, codepoint } => Step::Char { len, codepoint },
        Decoded::Invalid => {
            state.reset();
            Step::Byte
        }
        Decoded::Incomplete => {
            state.reset();
            Step::Truncated
        }
        Decoded::End => Step::End,
    }
}

/// Skip predicate. Unknown widths count as visible.
fn is_zero_width(widths: &mut WidthCache, codepoint: u32) -> bool {
    widths.width_or_default(codepoint) == 0
}

/// Distance from `point` forward to the nearest boundary at or after it.
/// `None` when `point` lies past the end of the string.
pub fn adjust_point(
    backend: &dyn EncodingBackend,
    buf: &[u8],
    point: usize,
    state: &mut DecodeState,
) -> Option<usize> {
    let length = c_strlen(buf);
    if point > length {
        return None;
    }

    let mut pos = 0;
    while pos < point {
        match consume(backend, &buf[pos..length], state) {
            Step::Char { len, .. } => pos += len,
            Step::Byte | Step::Truncated | Step::End => pos += 1,
        }
    }
    Some(pos - point)
}

/// Offset of the character `count` characters after `seed`.
///
/// A seed inside a character is first moved to the next boundary, which
/// counts as one step. With `FIND_NONZERO`, zero-width characters are passed
/// over without counting and the result never lands on one. Scanning stops
/// at the terminator or at a truncated trailing sequence.
pub fn find_next(
    backend: &dyn EncodingBackend,
    widths: &mut WidthCache,
    buf: &[u8],
    seed: usize,
    count: usize,
    flags: ScanFlags,
) -> usize {
    if count == 0 {
        return seed;
    }
    let nonzero = flags.contains(ScanFlags::FIND_NONZERO);
    let length = c_strlen(buf);
    let mut state = DecodeState::new();
    let mut count = count;

    let mut point = match adjust_point(backend, buf, seed, &mut state) {
        Some(delta) => seed + delta,
        None => length,
    };
    if seed < point {
        count -= 1;
    }

    while count > 0 {
        match consume(backend, &buf[point..length], &mut state) {
            Step::Byte => {
                point += 1;
                count -= 1;
            }
            Step::Truncated | Step::End => break,
            Step::Char { len, codepoint } => {
                point += len;
                if !(nonzero && is_zero_width(widths, codepoint)) {
                    count -= 1;
                }
            }
        }
    }

    if nonzero {
        while let Step::Char { len, codepoint } = consume(backend, &buf[point..length], &mut state) {
            if !is_zero_width(widths, codepoint) {
                break;
            }
            point += len;
        }
    }
    point
}

/// Start of the character before `seed`.
///
/// With `FIND_NONZERO`, zero-width characters are never returned; invalid
/// bytes always are. Returns the string length when `seed` is past it.
pub fn find_prev(
    backend: &dyn EncodingBackend,
    widths: &mut WidthCache,
    buf: &[u8],
    seed: usize,
    flags: ScanFlags,
) -> usize {
    let length = c_strlen(buf);
    if seed > length {
        return length;
    }
    let nonzero = flags.contains(ScanFlags::FIND_NONZERO);
    let mut state = DecodeState::new();

    let mut prev = 0;
    let mut point = 0;
    while point < seed {
        match consume(backend, &buf[point..length], &mut state) {
            Step::Byte | Step::Truncated => {
                prev = point;
                point += 1;
            }
            Step::End => break,
            Step::Char { len, codepoint } => {
                if !nonzero || !is_zero_width(widths, codepoint) {
                    prev = point;
                }
                point += len;
            }
        }
    }
    prev
}

/// Every boundary of the string in order, ending with its length.
pub fn boundaries(backend: &dyn EncodingBackend, buf: &[u8]) -> Vec<usize> {
    let length = c_strlen(buf);
    let mut state = DecodeState::new();
    let mut out = vec![0];
    let mut point = 0;
    while point < length {
        point += match consume(backend, &buf[point..length], &mut state) {
            Step::Char { len, .. } => len,
            _ => 1,
        };
        out.push(point);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::{ByteOriented, HostUtf8, Utf8Codec};
    use crate::core::width::UnicodeTableProbe;

    const ANY: ScanFlags = ScanFlags::empty();
    const NONZERO: ScanFlags = ScanFlags::FIND_NONZERO;

    fn widths() -> WidthCache {
        WidthCache::new(Box::new(UnicodeTableProbe))
    }

    fn next(buf: &[u8], seed: usize, count: usize, flags: ScanFlags) -> usize {
        find_next(&Utf8Codec, &mut widths(), buf, seed, count, flags)
    }

    fn prev(buf: &[u8], seed: usize, flags: ScanFlags) -> usize {
        find_prev(&Utf8Codec, &mut widths(), buf, seed, flags)
    }

    fn adjust(buf: &[u8], point: usize) -> Option<usize> {
        adjust_point(&Utf8Codec, buf, point, &mut DecodeState::new())
    }

    #[test]
    fn test_cafe_scenario() {
        let buf = "café".as_bytes();
        assert_eq!(buf.len(), 5);
        assert_eq!(next(buf, 0, 3, ANY), 3);
        assert_eq!(next(buf, 0, 4, ANY), 5);
        assert_eq!(adjust(buf, 4), Some(1));
        assert_eq!(adjust(buf, 3), Some(0));
        assert_eq!(adjust(buf, 5), Some(0));
        assert_eq!(adjust(buf, 6), None);
    }

    #[test]
    fn test_zero_count_returns_seed() {
        assert_eq!(next(b"abc", 2, 0, ANY), 2);
        assert_eq!(next(b"abc", 9, 0, ANY), 9);
    }

    #[test]
    fn test_forward_stops_at_terminator() {
        assert_eq!(next(b"ab\0cd", 0, 10, ANY), 2);
        assert_eq!(next(b"ab", 0, 10, ANY), 2);
        assert_eq!(next(b"", 0, 1, ANY), 0);
    }

    #[test]
    fn test_forward_seed_past_end() {
        assert_eq!(next(b"abc", 7, 1, ANY), 3);
    }

    #[test]
    fn test_forward_lands_on_each_character() {
        let s = "aé中😀z";
        let starts: Vec<usize> = s.char_indices().map(|(i, _)| i).chain([s.len()]).collect();
        for (k, &expected) in starts.iter().enumerate() {
            assert_eq!(next(s.as_bytes(), 0, k, ANY), expected, "k = {k}");
        }
    }

    #[test]
    fn test_mid_character_seed_counts_one_step() {
        // 中 occupies bytes 1..4
        let buf = "a中b".as_bytes();
        assert_eq!(next(buf, 2, 1, ANY), 4);
        assert_eq!(next(buf, 2, 2, ANY), 5);
    }

    #[test]
    fn test_invalid_byte_is_one_step() {
        let clean = "xé中y".as_bytes().to_vec();
        let mut dirty = clean.clone();
        dirty.insert(1, 0x80);
        // One extra step for the stray byte, then identical boundaries shifted by one
        assert_eq!(next(&dirty, 0, 1, ANY), 1);
        assert_eq!(next(&dirty, 0, 2, ANY), 2);
        for k in 1..=4 {
            assert_eq!(next(&dirty, 0, k + 1, ANY), next(&clean, 0, k, ANY) + 1, "k = {k}");
        }
    }

    #[test]
    fn test_truncated_tail_stops_forward() {
        let buf = [b'a', b'b', 0xE4, 0xB8];
        assert_eq!(next(&buf, 0, 5, ANY), 2);
        // Backward scan still treats the tail as single bytes
        assert_eq!(prev(&buf, 4, ANY), 3);
        assert_eq!(adjust(&buf, 3), Some(0));
    }

    #[test]
    fn test_zero_width_skip() {
        let buf = "a\u{0301}b".as_bytes();
        assert_eq!(next(buf, 0, 1, NONZERO), 3);
        assert_eq!(next(buf, 0, 1, ANY), 1);
    }

    #[test]
    fn test_zero_width_not_counted() {
        let buf = "a\u{0301}\u{0301}bc".as_bytes();
        assert_eq!(next(buf, 0, 2, NONZERO), 6);
        assert_eq!(next(buf, 0, 3, NONZERO), 7);
    }

    #[test]
    fn test_backward_basic() {
        let buf = "café".as_bytes();
        assert_eq!(prev(buf, 0, ANY), 0);
        assert_eq!(prev(buf, 1, ANY), 0);
        assert_eq!(prev(buf, 5, ANY), 3);
        assert_eq!(prev(buf, 4, ANY), 3);
        assert_eq!(prev(buf, 99, ANY), 5);
    }

    #[test]
    fn test_backward_inverts_forward() {
        let s = "ab中é😀\u{0301}x".as_bytes();
        let mut last = 0;
        for k in 1..=7 {
            let p = next(s, 0, k, ANY);
            assert_eq!(prev(s, p, ANY), last, "k = {k}");
            last = p;
        }
    }

    #[test]
    fn test_backward_skips_zero_width() {
        let buf = "a\u{0301}b".as_bytes();
        assert_eq!(prev(buf, 3, NONZERO), 0);
        assert_eq!(prev(buf, 3, ANY), 1);
    }

    #[test]
    fn test_backward_tracks_invalid_bytes() {
        let buf = [b'a', 0xFF, b'b'];
        assert_eq!(prev(&buf, 2, NONZERO), 1);
        assert_eq!(prev(&buf, 3, ANY), 2);
    }

    #[test]
    fn test_byte_oriented_backend() {
        let buf = "héllo".as_bytes();
        let mut w = widths();
        assert_eq!(find_next(&ByteOriented, &mut w, buf, 1, 2, ANY), 3);
        assert_eq!(find_prev(&ByteOriented, &mut w, buf, 3, ANY), 2);
        assert_eq!(adjust_point(&ByteOriented, buf, 2, &mut DecodeState::new()), Some(0));
    }

    #[test]
    fn test_host_backend_matches_bundled() {
        let buf = [b'q', 0xC3, 0xA9, 0x80, 0xE4, 0xB8, 0xAD, 0xF0, b'z'];
        let mut w = widths();
        for k in 0..8 {
            assert_eq!(
                find_next(&HostUtf8, &mut w, &buf, 0, k, ANY),
                find_next(&Utf8Codec, &mut w, &buf, 0, k, ANY)
            );
        }
        assert_eq!(boundaries(&HostUtf8, &buf), boundaries(&Utf8Codec, &buf));
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(boundaries(&Utf8Codec, "aé中".as_bytes()), vec![0, 1, 3, 6]);
        assert_eq!(boundaries(&Utf8Codec, &[0x80, b'a', 0]), vec![0, 1, 2]);
        assert_eq!(boundaries(&Utf8Codec, b""), vec![0]);
    }

    #[test]
    fn test_adjust_inside_characters() {
        let buf = "中😀".as_bytes();
        assert_eq!(adjust(buf, 1), Some(2));
        assert_eq!(adjust(buf, 2), Some(1));
        assert_eq!(adjust(buf, 4), Some(3));
        assert_eq!(adjust(buf, 6), Some(1));
        assert_eq!(adjust(buf, 7), Some(0));
    }
}
