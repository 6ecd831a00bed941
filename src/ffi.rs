/// C ABI bridge for line editors written in C.
/// Buffers are NUL-terminated strings; offsets and counts are C ints. Results
/// keep the classic conventions: -1 for an out-of-range adjustment or an
/// unknown width, 1/0 for comparisons.

use crate::config::Config;
use crate::core::{DecodeState, MbContext, ScanFlags};
use std::ffi::{c_char, c_int, CStr};

/// Flag value selecting zero-width skipping, as `ScanFlags::FIND_NONZERO`.
pub const MB_FIND_NONZERO: c_int = 0x01;

fn scan_flags(flags: c_int) -> ScanFlags {
    ScanFlags::from_bits_truncate(flags as u8)
}

/// Bytes of a C string, without its terminator. Null reads as empty.
unsafe fn c_bytes<'a>(s: *const c_char) -> &'a [u8] {
    if s.is_null() {
        &[]
    } else {
        CStr::from_ptr(s).to_bytes()
    }
}

fn to_c(n: usize) -> c_int {
    c_int::try_from(n).unwrap_or(c_int::MAX)
}

#[no_mangle]
pub extern "C" fn mb_context_new() -> *mut MbContext {
    Box::into_raw(Box::new(MbContext::utf8()))
}

/// Context built from `~/.config/mbcursor/config.toml`.
#[no_mangle]
pub extern "C" fn mb_context_new_from_config() -> *mut MbContext {
    Box::into_raw(Box::new(MbContext::from_config(&Config::load())))
}

#[no_mangle]
pub extern "C" fn mb_context_free(ctx: *mut MbContext) {
    if !ctx.is_null() {
        unsafe { drop(Box::from_raw(ctx)); }
    }
}

/// Name of the context's encoding backend. Static; do not free.
#[no_mangle]
pub extern "C" fn mb_backend_name(ctx: *const MbContext) -> *const c_char {
    let ctx = unsafe { &*ctx };
    match ctx.backend().name() {
        "host" => c"host".as_ptr(),
        "bytes" => c"bytes".as_ptr(),
        _ => c"utf8".as_ptr(),
    }
}

/// Offset `count` characters after `seed`. A negative seed is treated as 0;
/// a non-positive count returns the seed.
#[no_mangle]
pub extern "C" fn mb_find_next(
    ctx: *mut MbContext,
    string: *const c_char,
    seed: c_int,
    count: c_int,
    flags: c_int,
) -> c_int {
    let ctx = unsafe { &mut *ctx };
    let buf = unsafe { c_bytes(string) };
    let seed = seed.max(0);
    if count <= 0 {
        return seed;
    }
    to_c(ctx.find_next(buf, seed as usize, count as usize, scan_flags(flags)))
}

/// Start of the character before `seed`.
#[no_mangle]
pub extern "C" fn mb_find_prev(
    ctx: *mut MbContext,
    string: *const c_char,
    seed: c_int,
    flags: c_int,
) -> c_int {
    let ctx = unsafe { &mut *ctx };
    let buf = unsafe { c_bytes(string) };
    if seed <= 0 {
        return 0;
    }
    to_c(ctx.find_prev(buf, seed as usize, scan_flags(flags)))
}

/// Distance from `point` to the next boundary, or -1 if `point` is negative
/// or past the end of the string.
#[no_mangle]
pub extern "C" fn mb_adjust_point(
    ctx: *mut MbContext,
    string: *const c_char,
    point: c_int,
) -> c_int {
    let ctx = unsafe { &mut *ctx };
    let buf = unsafe { c_bytes(string) };
    if point < 0 {
        return -1;
    }
    ctx.adjust_point(buf, point as usize, None).map(to_c).unwrap_or(-1)
}

/// Display columns of `codepoint`, or -1 if it cannot be measured.
#[no_mangle]
pub extern "C" fn mb_width(ctx: *mut MbContext, codepoint: u32) -> c_int {
    let ctx = unsafe { &mut *ctx };
    ctx.width_of(codepoint).map(c_int::from).unwrap_or(-1)
}

/// 1 if the characters at the two positions are the same bytes, else 0.
#[no_mangle]
pub extern "C" fn mb_compare_chars(
    ctx: *const MbContext,
    buf1: *const c_char,
    pos1: c_int,
    buf2: *const c_char,
    pos2: c_int,
) -> c_int {
    let ctx = unsafe { &*ctx };
    if pos1 < 0 || pos2 < 0 {
        return 0;
    }
    let (a, b) = unsafe { (c_bytes(buf1), c_bytes(buf2)) };
    let equal = ctx.chars_equal(
        a,
        pos1 as usize,
        &mut DecodeState::new(),
        b,
        pos2 as usize,
        &mut DecodeState::new(),
    );
    c_int::from(equal)
}

/// Codepoint at `index`, or the raw byte value where none can be decoded.
#[no_mangle]
pub extern "C" fn mb_char_value(ctx: *const MbContext, string: *const c_char, index: c_int) -> u32 {
    let ctx = unsafe { &*ctx };
    let buf = unsafe { c_bytes(string) };
    if index < 0 {
        return 0;
    }
    ctx.char_value(buf, index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_ffi_navigation() {
        let ctx = mb_context_new();
        let s = CString::new("café").unwrap();
        assert_eq!(mb_find_next(ctx, s.as_ptr(), 0, 3, 0), 3);
        assert_eq!(mb_find_next(ctx, s.as_ptr(), 0, 4, 0), 5);
        assert_eq!(mb_find_next(ctx, s.as_ptr(), -4, 1, 0), 1);
        assert_eq!(mb_find_next(ctx, s.as_ptr(), 2, -1, 0), 2);
        assert_eq!(mb_find_prev(ctx, s.as_ptr(), 5, 0), 3);
        assert_eq!(mb_find_prev(ctx, s.as_ptr(), -1, 0), 0);
        assert_eq!(mb_adjust_point(ctx, s.as_ptr(), 4), 1);
        assert_eq!(mb_adjust_point(ctx, s.as_ptr(), -1), -1);
        assert_eq!(mb_adjust_point(ctx, s.as_ptr(), 6), -1);
        mb_context_free(ctx);
    }

    #[test]
    fn test_ffi_nonzero_flag() {
        let ctx = mb_context_new();
        let s = CString::new("a\u{0301}b").unwrap();
        assert_eq!(mb_find_next(ctx, s.as_ptr(), 0, 1, MB_FIND_NONZERO), 3);
        assert_eq!(mb_find_prev(ctx, s.as_ptr(), 3, MB_FIND_NONZERO), 0);
        mb_context_free(ctx);
    }

    #[test]
    fn test_ffi_width_and_compare() {
        let ctx = mb_context_new();
        assert_eq!(mb_width(ctx, 0x4E2D), 2);
        assert_eq!(mb_width(ctx, 0x11_0000), -1);
        let a = CString::new("x中").unwrap();
        let b = CString::new("中").unwrap();
        assert_eq!(mb_compare_chars(ctx, a.as_ptr(), 1, b.as_ptr(), 0), 1);
        assert_eq!(mb_compare_chars(ctx, a.as_ptr(), 0, b.as_ptr(), 0), 0);
        assert_eq!(mb_compare_chars(ctx, a.as_ptr(), -1, b.as_ptr(), 0), 0);
        assert_eq!(mb_char_value(ctx, a.as_ptr(), 1), 0x4E2D);
        let name = unsafe { CStr::from_ptr(mb_backend_name(ctx)) };
        assert_eq!(name.to_str().unwrap(), "utf8");
        mb_context_free(ctx);
    }

    #[test]
    fn test_ffi_null_string() {
        let ctx = mb_context_new();
        assert_eq!(mb_find_next(ctx, std::ptr::null(), 0, 1, 0), 0);
        assert_eq!(mb_adjust_point(ctx, std::ptr::null(), 0), 0);
        mb_context_free(ctx);
    }
}
