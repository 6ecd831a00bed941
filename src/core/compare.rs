/// Character-level comparisons used by incremental search and completion.
/// Comparison is byte-wise: both sides are assumed to share one encoding.

use crate::core::backend::EncodingBackend;
use crate::core::scan::{c_strlen, tail};
use crate::core::utf8::{DecodeState, Decoded};

/// Length-only decode of the character at the start of `bytes`.
/// The state is reset on `Invalid` and `Incomplete`.
pub fn char_len(backend: &dyn EncodingBackend, bytes: &[u8], state: &mut DecodeState) -> Decoded {
    let decoded = backend.decode(bytes, state);
    if matches!(decoded, Decoded::Invalid | Decoded::Incomplete) {
        state.reset();
    }
    decoded
}

/// Whether the characters at `pos_a` in `a` and `pos_b` in `b` are the same
/// bytes. False if either position does not hold a complete character.
pub fn chars_equal(
    backend: &dyn EncodingBackend,
    a: &[u8],
    pos_a: usize,
    state_a: &mut DecodeState,
    b: &[u8],
    pos_b: usize,
    state_b: &mut DecodeState,
) -> bool {
    let Some(len_a) = char_len(backend, tail(a, pos_a), state_a).consumed() else {
        return false;
    };
    let Some(len_b) = char_len(backend, tail(b, pos_b), state_b).consumed() else {
        return false;
    };
    len_a == len_b && a[pos_a..pos_a + len_a] == b[pos_b..pos_b + len_b]
}

/// Whether `mbchar` occurs at `seed` in `buf` without extending past `end`.
pub fn mbchar_matches(buf: &[u8], seed: usize, end: usize, mbchar: &[u8]) -> bool {
    if end.saturating_sub(seed) < mbchar.len() {
        return false;
    }
    buf.get(seed..seed + mbchar.len()) == Some(mbchar)
}

/// Codepoint of the character at `index`. Falls back to the raw byte value
/// at the last byte of the string, on undecodable input, and in byte mode.
pub fn char_value(backend: &dyn EncodingBackend, buf: &[u8], index: usize) -> u32 {
    let raw = buf.get(index).copied().unwrap_or(0) as u32;
    if !backend.is_multibyte() || index >= c_strlen(buf).saturating_sub(1) {
        return raw;
    }
    match backend.decode(tail(buf, index), &mut DecodeState::new()) {
        Decoded::Char { codepoint, .. } => codepoint,
        _ => raw,
    }
}
