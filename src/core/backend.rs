/// Encoding backends: the single capability every scanner decodes through.
/// Chosen once per context from configuration.

use crate::core::utf8::{self, DecodeState, Decoded, EncodeError, MAX_CHAR_LEN};
use serde::Deserialize;

pub trait EncodingBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decode one character from the start of `bytes`, resuming from `state`.
    fn decode(&self, bytes: &[u8], state: &mut DecodeState) -> Decoded;

    /// Encode one codepoint into `out`, returning the bytes written.
    fn encode(&self, codepoint: u32, out: &mut [u8; MAX_CHAR_LEN]) -> Result<usize, EncodeError>;

    /// False when every byte is its own character.
    fn is_multibyte(&self) -> bool {
        true
    }

    /// Decode characters until the terminator, an error, or the end of `bytes`.
    /// Returns the codepoints and the number of bytes consumed.
    fn decode_all(&self, bytes: &[u8], state: &mut DecodeState) -> (Vec<u32>, usize) {
        let mut out = Vec::new();
        let mut pos = 0;
        while let Decoded::Char { len, codepoint } = self.decode(&bytes[pos..], state) {
            out.push(codepoint);
            pos += len;
        }
        (out, pos)
    }

    /// Encode a codepoint sequence, stopping at a NUL codepoint.
    fn encode_all(&self, codepoints: &[u32]) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(codepoints.len());
        let mut buf = [0u8; MAX_CHAR_LEN];
        for &cp in codepoints.iter().take_while(|&&cp| cp != 0) {
            let n = self.encode(cp, &mut buf)?;
            out.extend_from_slice(&buf[..n]);
        }
        Ok(out)
    }
}

/// Which backend a context decodes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Bundled UTF-8 state machine.
    #[default]
    Utf8,
    /// UTF-8 validated by the standard library.
    Host,
    /// One byte per character.
    Bytes,
}

impl BackendKind {
    pub fn build(self) -> Box<dyn EncodingBackend> {
        match self {
            BackendKind::Utf8 => Box::new(Utf8Codec),
            BackendKind::Host => Box::new(HostUtf8),
            BackendKind::Bytes => Box::new(ByteOriented),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec;

impl EncodingBackend for Utf8Codec {
    fn name(&self) -> &'static str {
        "utf8"
    }

    fn decode(&self, bytes: &[u8], state: &mut DecodeState) -> Decoded {
        utf8::decode(bytes, state)
    }

    fn encode(&self, codepoint: u32, out: &mut [u8; MAX_CHAR_LEN]) -> Result<usize, EncodeError> {
        utf8::encode(codepoint, out)
    }
}

/// UTF-8 through `std::str::from_utf8`. Truncated prefixes are kept in the
/// caller's state and prepended to the next call's input.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostUtf8;

impl EncodingBackend for HostUtf8 {
    fn name(&self) -> &'static str {
        "host"
    }

    fn decode(&self, bytes: &[u8], state: &mut DecodeState) -> Decoded {
        if bytes.is_empty() {
            return Decoded::Incomplete;
        }
        if !state.is_pending() && bytes[0] == 0 {
            return Decoded::End;
        }

        let held = state.pending().len();
        let take = bytes.len().min(MAX_CHAR_LEN - held);
        let mut window = [0u8; MAX_CHAR_LEN];
        window[..held].copy_from_slice(state.pending());
        window[held..held + take].copy_from_slice(&bytes[..take]);
        let window = &window[..held + take];

        let valid = match std::str::from_utf8(window) {
            Ok(s) => s,
            Err(e) if e.valid_up_to() > 0 => {
                // The prefix up to valid_up_to is UTF-8 by construction
                std::str::from_utf8(&window[..e.valid_up_to()]).unwrap_or_default()
            }
            Err(e) if e.error_len().is_none() => {
                let expected = utf8::sequence_len(window[0]).unwrap_or(MAX_CHAR_LEN);
                state.stash(window, expected);
                return Decoded::Incomplete;
            }
            Err(_) => {
                state.reset();
                return Decoded::Invalid;
            }
        };

        let Some(ch) = valid.chars().next() else {
            state.reset();
            return Decoded::Invalid;
        };
        let total = ch.len_utf8();
        state.reset();
        if total <= held {
            return Decoded::Invalid;
        }
        Decoded::Char { len: total - held, codepoint: ch as u32 }
    }

    fn encode(&self, codepoint: u32, out: &mut [u8; MAX_CHAR_LEN]) -> Result<usize, EncodeError> {
        let ch = char::from_u32(codepoint).ok_or(EncodeError { codepoint })?;
        Ok(ch.encode_utf8(out).len())
    }
}

/// Byte-oriented mode: each non-NUL byte is a character whose codepoint is
/// the byte value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteOriented;

impl EncodingBackend for ByteOriented {
    fn name(&self) -> &'static str {
        "bytes"
    }

    fn decode(&self, bytes: &[u8], state: &mut DecodeState) -> Decoded {
        state.reset();
        match bytes.first() {
            None => Decoded::Incomplete,
            Some(0) => Decoded::End,
            Some(&b) => Decoded::Char { len: 1, codepoint: b as u32 },
        }
    }

    fn encode(&self, codepoint: u32, out: &mut [u8; MAX_CHAR_LEN]) -> Result<usize, EncodeError> {
        let byte = u8::try_from(codepoint).map_err(|_| EncodeError { codepoint })?;
        out[0] = byte;
        Ok(1)
    }

    fn is_multibyte(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUTS: &[&[u8]] = &[
        b"plain ascii",
        "café".as_bytes(),
        "日本語テキスト".as_bytes(),
        "🦀 crab".as_bytes(),
        &[0x80, b'a'],
        &[0xC3],
        &[0xE2, 0x82],
        &[0xC3, b'x'],
        &[0xED, 0xA0, 0x80],
        &[0xF4, 0x90, 0x80, 0x80],
        &[0xE0, 0x9F, 0xBF],
        b"\0tail",
    ];

    #[test]
    fn test_host_agrees_with_bundled() {
        for input in INPUTS {
            let mut a = DecodeState::new();
            let mut b = DecodeState::new();
            assert_eq!(
                Utf8Codec.decode(input, &mut a),
                HostUtf8.decode(input, &mut b),
                "input {input:x?}"
            );
            assert_eq!(a.pending(), b.pending(), "input {input:x?}");
        }
    }

    #[test]
    fn test_host_resumes_pending() {
        let mut ps = DecodeState::new();
        assert_eq!(HostUtf8.decode(&[0xF0, 0x9F], &mut ps), Decoded::Incomplete);
        assert_eq!(HostUtf8.decode(&[0x98], &mut ps), Decoded::Incomplete);
        assert_eq!(
            HostUtf8.decode(&[0x80, b'!'], &mut ps),
            Decoded::Char { len: 1, codepoint: 0x1F600 }
        );
        assert!(!ps.is_pending());
    }

    #[test]
    fn test_byte_oriented() {
        let mut ps = DecodeState::new();
        assert_eq!(ByteOriented.decode(&[0xC3, 0xA9], &mut ps), Decoded::Char { len: 1, codepoint: 0xC3 });
        assert_eq!(ByteOriented.decode(b"\0", &mut ps), Decoded::End);
        assert!(!ByteOriented.is_multibyte());

        let mut out = [0u8; MAX_CHAR_LEN];
        assert_eq!(ByteOriented.encode(0xE9, &mut out), Ok(1));
        assert_eq!(out[0], 0xE9);
        assert!(ByteOriented.encode(0x100, &mut out).is_err());
    }

    #[test]
    fn test_decode_all_stops_at_terminator() {
        let mut ps = DecodeState::new();
        let (cps, used) = Utf8Codec.decode_all("aé\0zz".as_bytes(), &mut ps);
        assert_eq!(cps, vec!['a' as u32, 0xE9]);
        assert_eq!(used, 3);
    }

    #[test]
    fn test_decode_all_stops_at_invalid() {
        let mut ps = DecodeState::new();
        let (cps, used) = HostUtf8.decode_all(&[b'o', b'k', 0xFF, b'x'], &mut ps);
        assert_eq!(cps, vec!['o' as u32, 'k' as u32]);
        assert_eq!(used, 2);
    }

    #[test]
    fn test_encode_all() {
        let bytes = Utf8Codec.encode_all(&[0x63, 0x61, 0x66, 0xE9, 0, 0x78]).unwrap();
        assert_eq!(bytes, "café".as_bytes());
        assert_eq!(
            HostUtf8.encode_all(&[0x61, 0xDFFF]),
            Err(EncodeError { codepoint: 0xDFFF })
        );
    }

    #[test]
    fn test_backend_kind_builds() {
        assert_eq!(BackendKind::default().build().name(), "utf8");
        assert_eq!(BackendKind::Host.build().name(), "host");
        assert!(!BackendKind::Bytes.build().is_multibyte());
    }
}
