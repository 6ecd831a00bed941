/// Bundled UTF-8 codec: a resumable single-character decoder and its encoder.
/// Handles sequences split across calls by carrying a `DecodeState`.

use std::fmt;
use std::ops::RangeInclusive;

/// Longest encoded character, in bytes.
pub const MAX_CHAR_LEN: usize = 4;

/// Highest Unicode scalar value.
pub const MAX_CODEPOINT: u32 = 0x10_FFFF;

/// Shift state carried between decode calls on one stream.
///
/// Either clean, or pending with the first bytes of a character that has not
/// been completed yet. Any decode error leaves the state clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeState {
    buf: [u8; MAX_CHAR_LEN],
    len: u8,
    expected: u8,
}

impl DecodeState {
    pub const fn new() -> Self {
        Self { buf: [0; MAX_CHAR_LEN], len: 0, expected: 0 }
    }

    /// Check if the state holds a partial character.
    pub fn is_pending(&self) -> bool {
        self.len > 0
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Bytes of the partial character held so far.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }

    /// Replace the pending bytes with `bytes` (at most `MAX_CHAR_LEN`).
    pub(crate) fn stash(&mut self, bytes: &[u8], expected: usize) {
        let n = bytes.len().min(MAX_CHAR_LEN);
        self.buf = [0; MAX_CHAR_LEN];
        self.buf[..n].copy_from_slice(&bytes[..n]);
        self.len = n as u8;
        self.expected = expected as u8;
    }
}

/// Result of decoding one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// A complete character. `len` counts the bytes taken from this call's input.
    Char { len: usize, codepoint: u32 },
    /// The input starts with the string terminator.
    End,
    /// The input is a valid but truncated prefix; the state is now pending.
    Incomplete,
    /// The input cannot start or continue a character; the state is clean.
    Invalid,
}

impl Decoded {
    /// Bytes consumed, when a character was decoded.
    pub fn consumed(&self) -> Option<usize> {
        match *self {
            Decoded::Char { len, .. } => Some(len),
            _ => None,
        }
    }
}

/// A codepoint the encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeError {
    pub codepoint: u32,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "codepoint U+{:04X} cannot be encoded", self.codepoint)
    }
}

impl std::error::Error for EncodeError {}

/// Length of the sequence opened by `lead`, or `None` if it cannot start one.
pub fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7f => Some(1),
        0xc2..=0xdf => Some(2),
        0xe0..=0xef => Some(3),
        0xf0..=0xf4 => Some(4),
        _ => None,
    }
}

/// Allowed second bytes after `lead`. Narrower ranges reject overlongs,
/// surrogates and values above U+10FFFF.
fn second_byte_range(lead: u8) -> RangeInclusive<u8> {
    match lead {
        0xe0 => 0xa0..=0xbf,
        0xed => 0x80..=0x9f,
        0xf0 => 0x90..=0xbf,
        0xf4 => 0x80..=0x8f,
        _ => 0x80..=0xbf,
    }
}

fn assemble(seq: &[u8]) -> u32 {
    let lead = seq[0] as u32;
    let mut cp = match seq.len() {
        1 => return lead,
        2 => lead & 0x1f,
        3 => lead & 0x0f,
        _ => lead & 0x07,
    };
    for &b in &seq[1..] {
        cp = (cp << 6) | (b as u32 & 0x3f);
    }
    cp
}

/// Decode one character from the start of `bytes`, resuming from `state`.
pub fn decode(bytes: &[u8], state: &mut DecodeState) -> Decoded {
    let Some(&first) = bytes.first() else {
        return Decoded::Incomplete;
    };

    let mut consumed = 0;
    if !state.is_pending() {
        if first == 0 {
            return Decoded::End;
        }
        if first < 0x80 {
            return Decoded::Char { len: 1, codepoint: first as u32 };
        }
        let Some(expected) = sequence_len(first) else {
            // Stray continuation byte or a lead that can never be valid
            state.reset();
            return Decoded::Invalid;
        };
        state.stash(&[first], expected);
        consumed = 1;
    }

    while state.len < state.expected {
        let Some(&byte) = bytes.get(consumed) else {
            return Decoded::Incomplete;
        };
        let allowed = if state.len == 1 {
            second_byte_range(state.buf[0])
        } else {
            0x80..=0xbf
        };
        if !allowed.contains(&byte) {
            state.reset();
            return Decoded::Invalid;
        }
        state.buf[state.len as usize] = byte;
        state.len += 1;
        consumed += 1;
    }

    let codepoint = assemble(&state.buf[..state.expected as usize]);
    state.reset();
    Decoded::Char { len: consumed, codepoint }
}

/// Encode `codepoint` into `out`, returning the number of bytes written.
pub fn encode(codepoint: u32, out: &mut [u8; MAX_CHAR_LEN]) -> Result<usize, EncodeError> {
    let err = EncodeError { codepoint };
    match codepoint {
        0x0000..=0x007f => {
            out[0] = codepoint as u8;
            Ok(1)
        }
        0x0080..=0x07ff => {
            out[0] = 0xc0 | (codepoint >> 6) as u8;
            out[1] = 0x80 | (codepoint & 0x3f) as u8;
            Ok(2)
        }
        0xd800..=0xdfff => Err(err),
        0x0800..=0xffff => {
            out[0] = 0xe0 | (codepoint >> 12) as u8;
            out[1] = 0x80 | ((codepoint >> 6) & 0x3f) as u8;
            out[2] = 0x80 | (codepoint & 0x3f) as u8;
            Ok(3)
        }
        0x1_0000..=MAX_CODEPOINT => {
            out[0] = 0xf0 | (codepoint >> 18) as u8;
            out[1] = 0x80 | ((codepoint >> 12) & 0x3f) as u8;
            out[2] = 0x80 | ((codepoint >> 6) & 0x3f) as u8;
            out[3] = 0x80 | (codepoint & 0x3f) as u8;
            Ok(4)
        }
        _ => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_fresh(bytes: &[u8]) -> Decoded {
        decode(bytes, &mut DecodeState::new())
    }

    #[test]
    fn test_ascii() {
        assert_eq!(decode_fresh(b"A"), Decoded::Char { len: 1, codepoint: 'A' as u32 });
        assert_eq!(decode_fresh(b"z rest"), Decoded::Char { len: 1, codepoint: 'z' as u32 });
    }

    #[test]
    fn test_terminator() {
        assert_eq!(decode_fresh(b"\0abc"), Decoded::End);
    }

    #[test]
    fn test_empty_is_incomplete() {
        assert_eq!(decode_fresh(b""), Decoded::Incomplete);
    }

    #[test]
    fn test_two_byte() {
        // é = 0xC3 0xA9
        assert_eq!(decode_fresh(&[0xC3, 0xA9]), Decoded::Char { len: 2, codepoint: 0xE9 });
    }

    #[test]
    fn test_three_byte_cjk() {
        // 中 = 0xE4 0xB8 0xAD
        assert_eq!(decode_fresh(&[0xE4, 0xB8, 0xAD]), Decoded::Char { len: 3, codepoint: 0x4E2D });
    }

    #[test]
    fn test_four_byte_emoji() {
        // 😀 = 0xF0 0x9F 0x98 0x80
        assert_eq!(
            decode_fresh(&[0xF0, 0x9F, 0x98, 0x80]),
            Decoded::Char { len: 4, codepoint: 0x1F600 }
        );
    }

    #[test]
    fn test_split_across_calls() {
        let mut ps = DecodeState::new();
        assert_eq!(decode(&[0xE4], &mut ps), Decoded::Incomplete);
        assert!(ps.is_pending());
        assert_eq!(decode(&[0xB8], &mut ps), Decoded::Incomplete);
        assert_eq!(ps.pending(), &[0xE4, 0xB8]);
        assert_eq!(decode(&[0xAD, b'x'], &mut ps), Decoded::Char { len: 1, codepoint: 0x4E2D });
        assert!(!ps.is_pending());
    }

    #[test]
    fn test_bare_continuation_is_invalid() {
        assert_eq!(decode_fresh(&[0x80, b'a']), Decoded::Invalid);
        assert_eq!(decode_fresh(&[0xBF]), Decoded::Invalid);
    }

    #[test]
    fn test_never_valid_leads() {
        for lead in [0xC0u8, 0xC1, 0xF5, 0xF8, 0xFF] {
            assert_eq!(decode_fresh(&[lead, 0x80]), Decoded::Invalid, "lead {lead:#x}");
        }
    }

    #[test]
    fn test_invalid_continuation_resets_state() {
        let mut ps = DecodeState::new();
        assert_eq!(decode(&[0xC3], &mut ps), Decoded::Incomplete);
        assert_eq!(decode(b"A", &mut ps), Decoded::Invalid);
        assert!(!ps.is_pending());
        assert_eq!(decode(b"A", &mut ps), Decoded::Char { len: 1, codepoint: 'A' as u32 });
    }

    #[test]
    fn test_nul_while_pending_is_invalid() {
        let mut ps = DecodeState::new();
        assert_eq!(decode(&[0xC3], &mut ps), Decoded::Incomplete);
        assert_eq!(decode(&[0x00], &mut ps), Decoded::Invalid);
    }

    #[test]
    fn test_overlong_and_surrogate_rejected() {
        // Overlong '/' as three bytes
        assert_eq!(decode_fresh(&[0xE0, 0x80, 0xAF]), Decoded::Invalid);
        // U+D800
        assert_eq!(decode_fresh(&[0xED, 0xA0, 0x80]), Decoded::Invalid);
        // Above U+10FFFF
        assert_eq!(decode_fresh(&[0xF4, 0x90, 0x80, 0x80]), Decoded::Invalid);
        // Overlong four-byte
        assert_eq!(decode_fresh(&[0xF0, 0x80, 0x80, 0x80]), Decoded::Invalid);
    }

    #[test]
    fn test_encode_matches_std() {
        for cp in [0x24u32, 0xA2, 0x939, 0x20AC, 0xD55C, 0xFFFF, 0x10348, MAX_CODEPOINT] {
            let mut out = [0u8; MAX_CHAR_LEN];
            let n = encode(cp, &mut out).unwrap();
            let mut expected = [0u8; MAX_CHAR_LEN];
            let s = char::from_u32(cp).unwrap().encode_utf8(&mut expected);
            assert_eq!(&out[..n], s.as_bytes());
        }
    }

    #[test]
    fn test_encode_rejects() {
        let mut out = [0u8; MAX_CHAR_LEN];
        assert_eq!(encode(0xD800, &mut out), Err(EncodeError { codepoint: 0xD800 }));
        assert_eq!(encode(0x110000, &mut out), Err(EncodeError { codepoint: 0x110000 }));
    }

    #[test]
    fn test_encode_then_decode_preserves_codepoint_and_length() {
        let samples = (0u32..0x800)
            .chain((0x800..0x1_0000).step_by(97))
            .chain((0x1_0000..=MAX_CODEPOINT).step_by(4099))
            .filter(|cp| !(0xD800..=0xDFFF).contains(cp) && *cp != 0);
        for cp in samples {
            let mut out = [0u8; MAX_CHAR_LEN];
            let n = encode(cp, &mut out).unwrap();
            assert_eq!(
                decode(&out[..n], &mut DecodeState::new()),
                Decoded::Char { len: n, codepoint: cp },
                "U+{cp:04X}"
            );
        }
    }
}
