#![no_main]
use libfuzzer_sys::fuzz_target;
use libmbcursor::core::{c_strlen, MbContext, ScanFlags};

fuzz_target!(|data: &[u8]| {
    let mut ctx = MbContext::utf8();
    let length = c_strlen(data);
    let bounds = ctx.boundaries(data);
    assert_eq!(bounds.last(), Some(&length));

    for (k, &b) in bounds.iter().enumerate() {
        assert_eq!(ctx.adjust_point(data, b, None), Some(0));
        if k > 0 {
            assert_eq!(ctx.find_prev(data, b, ScanFlags::empty()), bounds[k - 1]);
        }
    }
    for seed in 0..=length {
        let next = ctx.find_next(data, seed, 1, ScanFlags::FIND_NONZERO);
        assert!(next <= length);
        let snapped = ctx.snap(data, seed).unwrap();
        assert!(bounds.contains(&snapped));
    }
});
